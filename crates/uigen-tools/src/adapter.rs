//! Executes validated tool commands against the virtual file system.
//!
//! [`execute`] is the protocol boundary: whatever goes wrong, it returns a
//! [`ToolResult`] and never an `Err` or a panic.
//!
//! # Examples
//!
//! ```
//! use serde_json::json;
//! use uigen_tools::{ToolCall, execute};
//! use uigen_vfs::FileSystem;
//!
//! let mut fs = FileSystem::new();
//! let result = execute(&mut fs, &ToolCall::editor(json!({
//!     "command": "create",
//!     "path": "/components/Button.jsx",
//!     "content": "export default () => <button/>;"
//! })));
//!
//! assert!(result.ok);
//! assert!(fs.is_file("/components/Button.jsx"));
//! ```

use crate::error::{Result, ToolError};
use crate::types::{EditorCommand, ManagerCommand, ToolCall, ToolCommand, ToolResult};
use std::fmt::Write as _;
use uigen_vfs::{CreateOptions, EntryType, FileSystem, VfsPath};

/// Anything that can run a tool call and report a structured result.
///
/// Implemented for [`FileSystem`], so a session can hand its tree straight
/// to a turn runner.
pub trait ToolExecutor: Send {
    /// Runs one call. Must not panic and must not return until the effect of
    /// the call is durable.
    fn execute(&mut self, call: &ToolCall) -> ToolResult;
}

impl ToolExecutor for FileSystem {
    fn execute(&mut self, call: &ToolCall) -> ToolResult {
        execute(self, call)
    }
}

/// Validates and runs a raw call, converting every error into a failed result.
pub fn execute(fs: &mut FileSystem, call: &ToolCall) -> ToolResult {
    match ToolCommand::parse(call).and_then(|command| run(fs, &command)) {
        Ok(output) => ToolResult::success(output),
        Err(error) => {
            tracing::debug!(tool = %call.tool, code = error.code(), %error, "tool call failed");
            ToolResult::from(&error)
        }
    }
}

/// Runs a validated command and returns the text shown to the agent.
///
/// # Errors
///
/// Returns the VFS error or `AmbiguousMatch` / `MatchNotFound` /
/// `InvalidArgument` describing why nothing was changed.
pub fn run(fs: &mut FileSystem, command: &ToolCommand) -> Result<String> {
    match command {
        ToolCommand::Editor(EditorCommand::View { path, view_range }) => {
            view(fs, path, *view_range)
        }
        ToolCommand::Editor(EditorCommand::Create { path, content }) => {
            fs.create_file_with(path, content.as_str(), CreateOptions::with_parents())?;
            Ok(format!("File created: {}", VfsPath::new(path)?))
        }
        ToolCommand::Editor(EditorCommand::StrReplace {
            path,
            old_str,
            new_str,
        }) => str_replace(fs, path, old_str, new_str),
        ToolCommand::Editor(EditorCommand::Insert {
            path,
            insert_line,
            new_str,
        }) => insert(fs, path, *insert_line, new_str),
        ToolCommand::Manager(ManagerCommand::Rename { path, new_path }) => {
            fs.rename(path, new_path)?;
            Ok(format!(
                "Renamed {} to {}",
                VfsPath::new(path)?,
                VfsPath::new(new_path)?
            ))
        }
        ToolCommand::Manager(ManagerCommand::Delete { path }) => {
            fs.delete(path)?;
            Ok(format!("Deleted {}", VfsPath::new(path)?))
        }
    }
}

fn view(fs: &FileSystem, path: &str, range: Option<(usize, Option<usize>)>) -> Result<String> {
    if fs.is_dir(path) {
        let mut listing = String::new();
        for entry in fs.list_dir(path)? {
            let tag = match entry.entry_type {
                EntryType::Directory => "[DIR]",
                EntryType::File => "[FILE]",
            };
            let _ = writeln!(listing, "{tag} {}", entry.name);
        }
        if listing.is_empty() {
            listing.push_str("(empty directory)");
        }
        return Ok(listing.trim_end().to_string());
    }

    let content = fs.read_file(path)?;
    let lines: Vec<&str> = content.lines().collect();
    let (start, end) = match range {
        None => (1, lines.len()),
        Some((start, end)) => {
            if start > lines.len().max(1) {
                return Err(ToolError::invalid(
                    "view_range",
                    format!(
                        "start line {start} is past the end of the file ({} lines)",
                        lines.len()
                    ),
                ));
            }
            (start, end.unwrap_or(lines.len()).min(lines.len()))
        }
    };

    let width = end.max(1).to_string().len();
    let mut out = String::new();
    for (index, line) in lines.iter().enumerate().take(end).skip(start - 1) {
        let _ = writeln!(out, "{:>width$}\t{line}", index + 1);
    }
    Ok(out.trim_end_matches('\n').to_string())
}

fn str_replace(fs: &mut FileSystem, path: &str, old_str: &str, new_str: &str) -> Result<String> {
    if old_str.is_empty() {
        return Err(ToolError::invalid("old_str", "must not be empty"));
    }

    let content = fs.read_file(path)?;
    let occurrences = count_occurrences(&content, old_str);
    let normalized = VfsPath::new(path)?.to_string();
    match occurrences {
        0 => Err(ToolError::MatchNotFound { path: normalized }),
        1 => {
            let updated = content.replacen(old_str, new_str, 1);
            fs.update_file(path, updated)?;
            Ok(format!("Replaced text in {normalized}"))
        }
        occurrences => Err(ToolError::AmbiguousMatch {
            path: normalized,
            occurrences,
        }),
    }
}

/// Counts matches of `needle`, overlapping ones included: `"aa"` occurs
/// twice in `"aaa"`.
fn count_occurrences(haystack: &str, needle: &str) -> usize {
    let mut count = 0;
    let mut from = 0;
    while let Some(found) = haystack[from..].find(needle) {
        count += 1;
        let at = from + found;
        from = at + haystack[at..].chars().next().map_or(1, char::len_utf8);
    }
    count
}

fn insert(fs: &mut FileSystem, path: &str, after: usize, new_str: &str) -> Result<String> {
    let content = fs.read_file(path)?;
    let lines: Vec<&str> = content.lines().collect();
    if after > lines.len() {
        return Err(ToolError::invalid(
            "insert_line",
            format!("line {after} is past the end of the file ({} lines)", lines.len()),
        ));
    }

    let mut updated: Vec<&str> = Vec::with_capacity(lines.len() + 1);
    updated.extend_from_slice(&lines[..after]);
    updated.push(new_str);
    updated.extend_from_slice(&lines[after..]);
    let mut text = updated.join("\n");
    if content.ends_with('\n') || content.is_empty() {
        text.push('\n');
    }

    fs.update_file(path, text)?;
    Ok(format!("Inserted text after line {after} of {}", VfsPath::new(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uigen_vfs::FilesBuilder;

    fn project() -> FileSystem {
        FilesBuilder::new()
            .add_file("/App.jsx", "line one\nline two\nline three\n")
            .add_file("/components/Card.jsx", "const a = 1;\nconst a2 = 1;\n")
            .build()
            .unwrap()
    }

    fn editor(fs: &mut FileSystem, args: serde_json::Value) -> ToolResult {
        execute(fs, &ToolCall::editor(args))
    }

    #[test]
    fn test_view_file_numbers_lines() {
        let mut fs = project();
        let result = editor(&mut fs, json!({"command": "view", "path": "/App.jsx"}));
        assert!(result.ok);
        assert_eq!(result.result.unwrap(), "1\tline one\n2\tline two\n3\tline three");
    }

    #[test]
    fn test_view_range_to_eof() {
        let mut fs = project();
        let result = editor(
            &mut fs,
            json!({"command": "view", "path": "/App.jsx", "view_range": [2, -1]}),
        );
        assert_eq!(result.result.unwrap(), "2\tline two\n3\tline three");
    }

    #[test]
    fn test_view_directory_lists_children() {
        let mut fs = project();
        let result = editor(&mut fs, json!({"command": "view", "path": "/"}));
        assert_eq!(result.result.unwrap(), "[FILE] App.jsx\n[DIR] components");
    }

    #[test]
    fn test_view_missing_file() {
        let mut fs = project();
        let result = editor(&mut fs, json!({"command": "view", "path": "/nope.jsx"}));
        assert!(!result.ok);
        assert!(result.error.unwrap().starts_with("NotFound:"));
    }

    #[test]
    fn test_create_makes_parents() {
        let mut fs = project();
        let result = editor(
            &mut fs,
            json!({"command": "create", "path": "/lib/utils/cn.js", "content": "export {}"}),
        );
        assert!(result.ok, "{result:?}");
        assert!(fs.is_dir("/lib/utils"));
    }

    #[test]
    fn test_create_existing_is_conflict() {
        let mut fs = project();
        let result = editor(
            &mut fs,
            json!({"command": "create", "path": "/App.jsx", "content": ""}),
        );
        assert!(result.error.unwrap().starts_with("PathConflict:"));
        assert_eq!(fs.read_file("/App.jsx").unwrap(), "line one\nline two\nline three\n");
    }

    #[test]
    fn test_str_replace_unique() {
        let mut fs = project();
        let result = editor(
            &mut fs,
            json!({"command": "str_replace", "path": "/App.jsx", "old_str": "two", "new_str": "2"}),
        );
        assert!(result.ok);
        assert_eq!(fs.read_file("/App.jsx").unwrap(), "line one\nline 2\nline three\n");
    }

    #[test]
    fn test_str_replace_ambiguous_leaves_file() {
        let mut fs = project();
        let result = editor(
            &mut fs,
            json!({"command": "str_replace", "path": "/components/Card.jsx", "old_str": "const a", "new_str": "let b"}),
        );
        assert!(result.error.unwrap().starts_with("AmbiguousMatch:"));
        assert_eq!(
            fs.read_file("/components/Card.jsx").unwrap(),
            "const a = 1;\nconst a2 = 1;\n"
        );
    }

    #[test]
    fn test_str_replace_overlapping_matches_are_ambiguous() {
        let mut fs = FilesBuilder::new().add_file("/a.txt", "aaa").build().unwrap();
        let result = editor(
            &mut fs,
            json!({"command": "str_replace", "path": "/a.txt", "old_str": "aa", "new_str": "X"}),
        );
        assert!(!result.ok);
        let error = result.error.unwrap();
        assert!(error.starts_with("AmbiguousMatch:"), "{error}");
        assert!(error.contains("occurs 2 times in /a.txt"), "{error}");
        assert_eq!(fs.read_file("/a.txt").unwrap(), "aaa");
    }

    #[test]
    fn test_count_occurrences() {
        assert_eq!(count_occurrences("aaa", "aa"), 2);
        assert_eq!(count_occurrences("abab", "ab"), 2);
        assert_eq!(count_occurrences("ééé", "éé"), 2);
        assert_eq!(count_occurrences("abc", "d"), 0);
    }

    #[test]
    fn test_str_replace_no_match() {
        let mut fs = project();
        let result = editor(
            &mut fs,
            json!({"command": "str_replace", "path": "/App.jsx", "old_str": "four"}),
        );
        assert!(result.error.unwrap().starts_with("NotFound:"));
    }

    #[test]
    fn test_str_replace_empty_old_str_rejected() {
        let mut fs = project();
        let result = editor(
            &mut fs,
            json!({"command": "str_replace", "path": "/App.jsx", "old_str": ""}),
        );
        assert!(result.error.unwrap().starts_with("InvalidArgument:"));
    }

    #[test]
    fn test_insert_positions() {
        let mut fs = project();
        assert!(editor(&mut fs, json!({"command": "insert", "path": "/App.jsx", "insert_line": 0, "new_str": "top"})).ok);
        assert!(editor(&mut fs, json!({"command": "insert", "path": "/App.jsx", "insert_line": 4, "new_str": "bottom"})).ok);
        assert_eq!(
            fs.read_file("/App.jsx").unwrap(),
            "top\nline one\nline two\nline three\nbottom\n"
        );

        let result = editor(
            &mut fs,
            json!({"command": "insert", "path": "/App.jsx", "insert_line": 99, "new_str": "x"}),
        );
        assert!(!result.ok);
    }

    #[test]
    fn test_manager_rename_and_delete() {
        let mut fs = project();
        let result = execute(
            &mut fs,
            &ToolCall::manager(json!({"command": "rename", "path": "/components", "new_path": "/ui"})),
        );
        assert!(result.ok);
        assert!(fs.is_file("/ui/Card.jsx"));

        let result = execute(
            &mut fs,
            &ToolCall::manager(json!({"command": "delete", "path": "/ui"})),
        );
        assert!(result.ok);
        assert!(!fs.exists("/ui"));
    }

    #[test]
    fn test_malformed_path_is_failed_result() {
        let mut fs = project();
        let result = execute(
            &mut fs,
            &ToolCall::manager(json!({"command": "delete", "path": "../etc/passwd"})),
        );
        assert!(result.error.unwrap().starts_with("InvalidPath:"));
    }

    #[test]
    fn test_executor_trait_on_file_system() {
        let mut fs = project();
        let executor: &mut dyn ToolExecutor = &mut fs;
        let result = executor.execute(&ToolCall::new("unknown", json!({})));
        assert!(result.error.unwrap().starts_with("UnknownTool:"));
    }
}
