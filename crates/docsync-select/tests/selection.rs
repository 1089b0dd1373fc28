//! Integration test: analyze → recency → rank → preview on a scratch project.

use std::fs;
use std::path::Path;

use docsync_core::DocsyncConfig;
use docsync_graph::analyze_project;
use docsync_history::recency::RecentChanges;
use docsync_select::select_files;

fn write(root: &Path, path: &str, content: &str) {
    let full = root.join(path);
    fs::create_dir_all(full.parent().unwrap()).unwrap();
    fs::write(full, content).unwrap();
}

#[tokio::test]
async fn selects_top_files_with_previews() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "src/server.ts", "import { db } from './db';\nimport { routes } from './routes';\n");
    write(root, "src/routes.ts", "import { db } from './db';\nexport const routes = [];\n");
    write(root, "src/db.ts", &"export const db = {};\n".repeat(150));
    write(root, "docs/guide.md", "# Guide\n");
    write(root, "scripts/tmp.sh", "echo hi\n");

    let config = DocsyncConfig::default();
    let analysis = analyze_project(root, &config).await.unwrap();
    let recent = RecentChanges::from_revisions(vec![vec!["src/routes.ts".into()]]);

    let first = select_files(root, &analysis, &recent, &config.rank, 3).await.unwrap();
    let second = select_files(root, &analysis, &recent, &config.rank, 3).await.unwrap();
    assert_eq!(first, second);

    let paths: Vec<&str> = first.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths.len(), 3);
    assert_eq!(paths[0], "src/routes.ts");
    assert!(paths.contains(&"src/db.ts"));
    assert!(!paths.contains(&"scripts/tmp.sh"));

    let db = first.iter().find(|f| f.path == "src/db.ts").unwrap();
    assert_eq!(db.total_lines, 150);
    assert!(db.truncated);
    assert_eq!(db.content_preview.lines().count(), config.rank.preview_lines);
}
