use std::fs;
use std::path::{Path, PathBuf};

fn collect_rs_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        if let Ok(read_dir) = fs::read_dir(&dir) {
            for entry in read_dir.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    stack.push(path);
                } else if path.extension().map(|e| e == "rs").unwrap_or(false) {
                    files.push(path);
                }
            }
        }
    }
    files
}

/// SQL and the join tables stay behind the repository trait; services and
/// handlers only see `SocialRepository`.
#[test]
fn sql_lives_only_in_the_repository() {
    let src = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("src");
    let needles = ["sqlx::query", "INSERT INTO", "DELETE FROM"];

    let mut offenders = Vec::new();
    for file in collect_rs_files(&src) {
        let path_str = file.to_string_lossy().replace('\\', "/");
        if path_str.contains("/src/repository/") {
            continue;
        }
        let content = fs::read_to_string(&file).unwrap_or_default();
        if needles.iter().any(|n| content.contains(n)) {
            offenders.push(path_str);
        }
    }

    assert!(
        offenders.is_empty(),
        "SQL found outside src/repository: {:?}",
        offenders
    );
}
