pub const SYSTEM_PROMPT: &str = "You are an expert full-stack web developer. Your task is to generate complete, working code for web applications based on the user's description. Generate all necessary files for a complete, standalone web application.";

/// Builds the generation prompt, instructing the model to emit one fenced,
/// filename-annotated block per file.
pub fn build_prompt(app_description: &str) -> String {
    format!(
        r#"Generate a complete, working web application based on the following description:

"{app_description}"

Return the code as a set of files in markdown format. For each file, use the format:

```filename: path/to/file.ext
// File content here
```

Include ALL necessary files to make the application work, including:
- HTML/CSS/JavaScript files
- Backend code if required
- Package.json or other dependency files
- README.md with setup instructions

Make sure the application is complete, functional, and follows best practices."#
    )
}
