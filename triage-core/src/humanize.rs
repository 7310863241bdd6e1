//! Conversion of raw classifier labels into display names.

const SEPARATOR: char = '_';

/// Turns a raw class label such as `chestmnist_pleural_effusion` into
/// `Pleural effusion`. Labels without a dataset prefix only have their
/// separators replaced.
pub fn humanize(raw_label: &str) -> String {
    let condition = match raw_label.split_once(SEPARATOR) {
        Some((_prefix, rest)) => rest,
        None => raw_label,
    };
    capitalize(&condition.replace(SEPARATOR, " "))
}

/// Upper-cases the first character and lower-cases the rest.
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Upper-cases the first letter of every alphabetic run and lower-cases the rest.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_alpha = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}
