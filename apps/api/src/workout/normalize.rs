/// Title-cases an exercise name: the first letter of every word is upper case,
/// the rest lower case. Words break on whitespace, `-`, `/` and `(`.
/// Runs of whitespace collapse to a single space.
pub fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());

    for word in name.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        let mut at_word_start = true;
        for c in word.chars() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = matches!(c, '-' | '/' | '(');
        }
    }
    out
}
