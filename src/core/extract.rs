/// A single file parsed out of a model response. Consumed immediately by the
/// materialization step, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFile {
    pub path: String,
    pub content: String,
}

/// Scans a model response for fenced code blocks annotated with a filename
/// and returns them in source order, no deduplication.
///
/// A fence whose payload is non-empty opens a block; the payload is the
/// filename, or `label:filename` with everything after the first colon
/// taken as the filename. A bare fence closes the open block. Hitting a new
/// opener while a block is open flushes the open block first. A block still
/// open at end of input is dropped, not flushed; callers treat an empty
/// result as "no files generated".
pub fn extract_code_files(response: &str) -> Vec<ExtractedFile> {
    let mut files = Vec::new();
    let mut current_file: Option<String> = None;
    let mut current_content: Vec<&str> = Vec::new();

    for line in response.lines() {
        let payload = line.strip_prefix("```").map(str::trim);
        match payload {
            Some(payload) if !payload.is_empty() => {
                if let Some(path) = current_file.take() {
                    files.push(ExtractedFile {
                        path,
                        content: current_content.join("\n"),
                    });
                }
                let path = match payload.split_once(':') {
                    Some((_, name)) => name.trim(),
                    None => payload,
                };
                current_file = Some(path.to_string());
                current_content.clear();
            }
            _ if line.trim() == "```" => {
                if let Some(path) = current_file.take() {
                    files.push(ExtractedFile {
                        path,
                        content: current_content.join("\n"),
                    });
                    current_content.clear();
                }
            }
            _ => {
                if current_file.is_some() {
                    current_content.push(line);
                }
            }
        }
    }

    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_without_delimiters_yields_nothing() {
        assert!(extract_code_files("").is_empty());
        assert!(extract_code_files("Sure! Here is a plan:\n1. do things\n").is_empty());
    }

    #[test]
    fn well_formed_blocks_come_back_in_source_order() {
        let response = "Here is your app:\n\n\
```filename: index.html\n\
<!DOCTYPE html>\n\
<h1>Todo</h1>\n\
```\n\
Some commentary between files.\n\
```filename: js/app.js\n\
console.log(\"todo\");\n\
```\n";

        let files = extract_code_files(response);
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].path, "index.html");
        assert_eq!(files[0].content, "<!DOCTYPE html>\n<h1>Todo</h1>");
        assert_eq!(files[1].path, "js/app.js");
        assert_eq!(files[1].content, "console.log(\"todo\");");
    }

    #[test]
    fn filename_without_a_label_is_taken_verbatim() {
        let files = extract_code_files("``` <spaced name.txt> \nx\n```\n");
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "<spaced name.txt>");
    }

    #[test]
    fn label_before_the_first_colon_is_discarded() {
        let files = extract_code_files("```file:  src/main.py  \nprint(1)\n```\n");
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "src/main.py");
    }

    #[test]
    fn opener_while_a_block_is_open_flushes_the_open_block() {
        let response = "```filename: a.txt\nfirst\n```filename: b.txt\nsecond\n```\n";
        let files = extract_code_files(response);
        assert_eq!(files.len(), 2);
        assert_eq!(files[0], ExtractedFile { path: "a.txt".to_string(), content: "first".to_string() });
        assert_eq!(files[1], ExtractedFile { path: "b.txt".to_string(), content: "second".to_string() });
    }

    #[test]
    fn unterminated_trailing_block_is_dropped() {
        let response = "```filename: a.txt\ncomplete\n```\n```filename: b.txt\nnever closed";
        let files = extract_code_files(response);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "a.txt");
    }

    #[test]
    fn lines_outside_any_block_are_discarded() {
        let response = "stray line\n```\nanother stray fence\n```filename: only.txt\nkept\n```\n";
        let files = extract_code_files(response);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "only.txt");
        assert_eq!(files[0].content, "kept");
    }
}
