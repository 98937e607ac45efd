use anyhow::{anyhow, Result};

/// Extract the first top-level JSON object from generative output.
///
/// Models are asked for bare JSON but routinely wrap it in a fenced code
/// block or preface it with prose. This scans for the first `{` and returns
/// the slice through its matching `}`, honoring string literals and escapes.
pub fn extract_json_block(text: &str) -> Result<&str> {
    let start = text
        .find('{')
        .ok_or_else(|| anyhow!("no JSON object found in response"))?;

    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    Err(anyhow!("unbalanced JSON object in response"))
}
