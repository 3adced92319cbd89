use std::num::ParseIntError;

/// Parse a CAN identifier given in decimal or `0x` hex.
pub fn parse_can_id(s: &str) -> Result<u32, ParseIntError> {
    if let Some(stripped) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(stripped, 16)
    } else {
        s.parse::<u32>()
    }
}

/// Parse a payload written as hex bytes: `01,02,03`, `01 02 03`, `010203`
/// or `0x01,0x02`.
pub fn parse_payload(s: &str) -> Result<Vec<u8>, String> {
    let tokens = s
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .map(|t| t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")).unwrap_or(t))
        .collect::<Vec<_>>();
    let mut bytes = Vec::new();
    for token in tokens {
        if token.len() <= 2 {
            bytes.push(u8::from_str_radix(token, 16).map_err(|e| format!("{:?}: {}", token, e))?);
            continue;
        }
        for pair in token.as_bytes().chunks(2) {
            let pair = std::str::from_utf8(pair).map_err(|e| e.to_string())?;
            if pair.len() != 2 {
                return Err(format!("odd number of hex digits in {:?}", token));
            }
            bytes.push(u8::from_str_radix(pair, 16).map_err(|e| format!("{:?}: {}", pair, e))?);
        }
    }
    Ok(bytes)
}
