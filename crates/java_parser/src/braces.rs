//! Brace matching that does not trip over string literals.
//!
//! A `{` or `}` inside a string or char literal (with `\` escapes honored)
//! does not change the depth, and neither does one inside a `//` or `/* */`
//! comment. Single quotes cover Java chars and Groovy strings alike.

use crate::ExtractError;

/// Returns the byte offset one past the `}` closing the first block that opens
/// at or after `from`.
pub fn block_end(text: &str, from: usize) -> Result<usize, ExtractError> {
    let bytes = text.as_bytes();
    let open = bytes
        .iter()
        .skip(from)
        .position(|&b| b == b'{')
        .map(|p| p + from)
        .ok_or(ExtractError::NoOpeningBrace(from))?;

    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut escaped = false;
    // comment kind (`/` or `*`) and the offset of its opening slash
    let mut comment: Option<(u8, usize)> = None;

    for (idx, &b) in bytes.iter().enumerate().skip(open) {
        if let Some((kind, start)) = comment {
            let closes = if kind == b'/' {
                b == b'\n'
            } else {
                b == b'/' && idx >= start + 3 && bytes[idx - 1] == b'*'
            };
            if closes {
                comment = None;
            }
            continue;
        }
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == q {
                quote = None;
            }
            continue;
        }

        match b {
            b'/' if matches!(bytes.get(idx + 1), Some(b'/' | b'*')) => {
                comment = bytes.get(idx + 1).map(|&kind| (kind, idx));
            }
            b'"' | b'\'' => quote = Some(b),
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(idx + 1);
                }
            }
            _ => {}
        }
    }

    Err(ExtractError::UnterminatedBlock {
        line: line_at(text, open),
    })
}

/// Inner text of the block opening at or after `from`, without the braces.
pub fn block_body(text: &str, from: usize) -> Result<&str, ExtractError> {
    let end = block_end(text, from)?;
    // block_end succeeded, so an opening brace exists
    let open = text[from..]
        .find('{')
        .map(|p| p + from)
        .ok_or(ExtractError::NoOpeningBrace(from))?;
    Ok(&text[open + 1..end - 1])
}

fn line_at(text: &str, offset: usize) -> usize {
    text.as_bytes()[..offset].iter().filter(|&&b| b == b'\n').count() + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_end_nested() {
        let text = "void a() {\n  if (x) {\n    y();\n  }\n}\n// end";
        let end = block_end(text, 0).unwrap();
        assert_eq!(&text[..end], "void a() {\n  if (x) {\n    y();\n  }\n}");
    }

    #[test]
    fn test_braces_in_strings_ignored() {
        let text = r#"m() { log("}{"); s = "\"}"; }"#;
        let end = block_end(text, 0).unwrap();
        assert_eq!(end, text.len());
    }

    #[test]
    fn test_char_literals_ignored() {
        let text = "boolean m(char c) {\n  if (c == '\"') { open = true; }\n  if (c == '{' || c == '\\'') { depth++; }\n  return c != '}';\n}\nvoid next() {}";
        let end = block_end(text, 0).unwrap();
        assert!(text[..end].ends_with("return c != '}';\n}"));
    }

    #[test]
    fn test_comments_ignored() {
        let text = "void m() {\n  // don't close } here\n  /* nor { here, it's fine */\n  run();\n}\n";
        let end = block_end(text, 0).unwrap();
        assert_eq!(end, text.len() - 1);
    }

    #[test]
    fn test_unterminated_block_reports_line() {
        let text = "class A {\n  void m() {\n";
        let err = block_end(text, 10).unwrap_err();
        assert_eq!(err, ExtractError::UnterminatedBlock { line: 2 });
    }

    #[test]
    fn test_no_opening_brace() {
        assert_eq!(
            block_end("abstract void m();", 0),
            Err(ExtractError::NoOpeningBrace(0))
        );
    }

    #[test]
    fn test_block_body() {
        let text = "sourceSets { main { java { srcDir 'x' } } }";
        assert_eq!(
            block_body(text, 0).unwrap(),
            " main { java { srcDir 'x' } } "
        );
    }
}
