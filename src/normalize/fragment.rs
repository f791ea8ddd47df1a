//! Balanced-brace scanning over noisy text

/// Byte spans of every balanced `{...}` object in `text`, largest first.
///
/// Braces inside JSON string literals (including escaped quotes) do not count.
/// Nested objects are reported as well as their parents.
pub fn object_spans(text: &str) -> Vec<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut stack: Vec<usize> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            // quotes outside any object are prose
            b'"' if !stack.is_empty() => in_string = true,
            b'{' => stack.push(i),
            b'}' => {
                if let Some(start) = stack.pop() {
                    spans.push((start, i + 1));
                }
            }
            _ => {}
        }
    }

    spans.sort_by(|a, b| (b.1 - b.0).cmp(&(a.1 - a.0)).then(a.0.cmp(&b.0)));
    spans
}

/// Largest-first object fragments as string slices
pub fn object_fragments(text: &str) -> Vec<&str> {
    object_spans(text)
        .into_iter()
        .map(|(start, end)| &text[start..end])
        .collect()
}
