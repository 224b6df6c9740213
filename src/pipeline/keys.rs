use crate::constants::{DANE_CODE_WIDTH, DEPARTMENT_CODE_WIDTH, MUNICIPALITY_CODE_WIDTH};

/// Left-pads a code with zeros to `width` characters.
///
/// Codes are handled as text so leading zeros survive. Codes already at or
/// beyond `width` are returned trimmed but otherwise untouched.
pub fn pad_code(code: &str, width: usize) -> String {
    format!("{:0>width$}", code.trim(), width = width)
}

/// Builds the five-digit DANE join key from a department and a municipality code.
pub fn join_key(department_code: &str, municipality_code: &str) -> String {
    let mut key = pad_code(department_code, DEPARTMENT_CODE_WIDTH);
    key.push_str(&pad_code(municipality_code, MUNICIPALITY_CODE_WIDTH));
    key
}

/// Pads a full municipality DANE code from the sales dataset to five digits.
pub fn normalize_dane_code(code: &str) -> String {
    pad_code(code, DANE_CODE_WIDTH)
}
