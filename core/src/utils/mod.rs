use std::fs::File;
use std::io;
use std::io::BufRead;
use std::path::Path;

/// Reads a target list, returning every non-empty trimmed line that is not a `#` comment.
pub fn read_lines(path: &str) -> io::Result<Vec<String>> {
    let file = File::open(Path::new(path))?;
    let reader = io::BufReader::new(file);
    let lines = reader
        .lines()
        .filter_map(|line| {
            let line = line.ok()?;
            let trimmed = line.trim().to_string();
            if trimmed.is_empty() || trimmed.starts_with('#') { None } else { Some(trimmed) }
        })
        .collect();
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_lines_skips_blanks_and_comments() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# targets").unwrap();
        writeln!(file, "  example.com  ").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "http://shop.example.fr").unwrap();

        let lines = read_lines(file.path().to_str().unwrap()).unwrap();
        assert_eq!(lines, vec!["example.com", "http://shop.example.fr"]);
    }

    #[test]
    fn test_read_lines_missing_file() {
        assert!(read_lines("/definitely/not/here.txt").is_err());
    }
}
