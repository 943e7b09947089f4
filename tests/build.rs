// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 assetflow contributors

//! End-to-end task runs over scratch project trees

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use assetflow::cache::{Cache, ContentHasher, FilesystemCache};
use assetflow::graph::TaskState;
use assetflow::notifier::RecordingNotifier;
use assetflow::tasks::{register_tasks, Watch};
use assetflow::transforms::compression_tag;
use assetflow::{AssetflowError, BuildConfig, BuildMode, TaskId, TaskRunner};
use tempfile::TempDir;

fn write(root: &Path, relative: &str, contents: &str) -> PathBuf {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, contents).unwrap();
    path
}

fn project() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(
        root,
        "src/styles/style.scss",
        "@import 'vars';\n.button {\n  color: $brand;\n  user-select: none;\n}\n",
    );
    write(root, "src/styles/_vars.scss", "$brand: #ff0000;\n");
    write(root, "src/js/a.js", "function a() {\n  return 1;\n}\n");
    write(root, "src/js/b.js", "// second\nconst b = a() + 1;\n");
    write(
        root,
        "src/assets/index.html",
        "<html><body><h1>Hello</h1></body></html>\n",
    );
    dir
}

fn runner(root: &Path, mode: BuildMode) -> (TaskRunner, Arc<RecordingNotifier>) {
    let config = BuildConfig::load(root, mode).unwrap();
    let graph = register_tasks(&config).unwrap();
    let notifier = Arc::new(RecordingNotifier::default());
    let runner = TaskRunner::new(graph, Arc::new(config), notifier.clone()).unwrap();
    (runner, notifier)
}

fn read(path: PathBuf) -> String {
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("{}: {e}", path.display()))
}

#[tokio::test]
async fn test_development_build_writes_source_maps() {
    let dir = project();
    let public = dir.path().join("public");
    let stale = write(dir.path(), "public/stale.js", "old");
    let (runner, notifier) = runner(dir.path(), BuildMode::Development);

    runner.run(TaskId::Build).await.unwrap();
    assert!(!stale.exists());

    let css = read(public.join("style.css"));
    assert!(css.contains("color: #ff0000") || css.contains("color: red"));
    assert!(css.contains("-webkit-user-select"));
    assert!(css.trim_end().ends_with("/*# sourceMappingURL=style.css.map */"));
    assert!(!public.join("style.min.css").exists());

    let map: serde_json::Value = serde_json::from_str(&read(public.join("style.css.map"))).unwrap();
    assert_eq!(map["version"], 3);
    assert_eq!(map["file"], "style.css");

    let js = read(public.join("script.js"));
    assert!(js.find("function a()").unwrap() < js.find("const b").unwrap());
    assert!(js.trim_end().ends_with("//# sourceMappingURL=script.js.map"));

    let map: serde_json::Value = serde_json::from_str(&read(public.join("script.js.map"))).unwrap();
    assert_eq!(map["sources"], serde_json::json!(["a.js", "b.js"]));

    assert_eq!(read(public.join("index.html")), "<html><body><h1>Hello</h1></body></html>\n");
    assert!(notifier.messages().is_empty());
    assert_eq!(runner.state(TaskId::Build).await, Some(TaskState::Succeeded));
}

#[tokio::test]
async fn test_production_build_minifies_without_maps() {
    let dir = project();
    let public = dir.path().join("public");
    let (runner, _) = runner(dir.path(), BuildMode::Production);

    runner.run(TaskId::Build).await.unwrap();

    let css = read(public.join("style.css"));
    let min_css = read(public.join("style.min.css"));
    assert!(!css.contains("sourceMappingURL"));
    assert!(min_css.len() < css.len());
    assert!(!min_css.trim_end().contains('\n'));

    let min_js = read(public.join("script.min.js"));
    assert!(!min_js.contains("second"));
    assert!(public.join("script.js").exists());

    assert!(!public.join("style.css.map").exists());
    assert!(!public.join("script.js.map").exists());
}

#[tokio::test]
async fn test_clean_removes_stale_output() {
    let dir = project();
    let stale = write(dir.path(), "public/old.css", "stale");
    let (runner, _) = runner(dir.path(), BuildMode::Development);

    runner.run(TaskId::Clean).await.unwrap();
    assert!(!stale.exists());

    // Nothing left to delete is still a success
    runner.run(TaskId::Clean).await.unwrap();
}

#[tokio::test]
async fn test_missing_stylesheet_fails_the_build() {
    let dir = project();
    fs::remove_file(dir.path().join("src/styles/style.scss")).unwrap();
    let (runner, notifier) = runner(dir.path(), BuildMode::Development);

    let err = runner.run(TaskId::Build).await.unwrap_err();
    assert!(matches!(err, AssetflowError::TaskExecution { ref task, .. } if task == "styles"));
    assert!(matches!(err.root_cause(), AssetflowError::FileNotFound { .. }));

    // The other parallel members still ran to completion
    assert!(dir.path().join("public/script.js").exists());
    assert_eq!(notifier.titles(), vec!["Styles"]);
    assert_eq!(runner.state(TaskId::Build).await, Some(TaskState::Failed));
}

#[tokio::test]
async fn test_assets_only_copy_changed_files() {
    let dir = project();
    let page = dir.path().join("src/assets/index.html");
    let (runner, _) = runner(dir.path(), BuildMode::Development);

    let first = runner.run(TaskId::Assets).await.unwrap();
    assert_eq!(first.outputs().len(), 1);

    let second = runner.run(TaskId::Assets).await.unwrap();
    assert!(second.outputs().is_empty());

    fs::write(&page, "<p>edited</p>").unwrap();
    let later = SystemTime::now() + Duration::from_secs(5);
    fs::File::options()
        .write(true)
        .open(&page)
        .unwrap()
        .set_modified(later)
        .unwrap();

    let third = runner.run(TaskId::Assets).await.unwrap();
    assert_eq!(third.outputs().len(), 1);
    assert_eq!(read(dir.path().join("public/index.html")), "<p>edited</p>");
}

#[tokio::test]
async fn test_images_reuse_cached_compression() {
    let dir = project();
    let original = b"not really a png".to_vec();
    let image = dir.path().join("src/assets/img/icons/logo.png");
    fs::create_dir_all(image.parent().unwrap()).unwrap();
    fs::write(&image, &original).unwrap();

    let config = BuildConfig::load(dir.path(), BuildMode::Development).unwrap();
    let cache = FilesystemCache::new(config.cache_path()).unwrap();
    cache
        .store(&ContentHasher::key_for(compression_tag(&image), &original), b"from-cache")
        .await
        .unwrap();

    let (runner, _) = runner(dir.path(), BuildMode::Development);
    runner.run(TaskId::Img).await.unwrap();

    assert_eq!(
        fs::read(dir.path().join("public/img/icons/logo.png")).unwrap(),
        b"from-cache"
    );
}

#[tokio::test]
async fn test_images_compress_svg_and_copy_unknown_formats() {
    let dir = project();
    write(
        dir.path(),
        "src/assets/img/logo.svg",
        "<svg xmlns=\"http://www.w3.org/2000/svg\">\n  <!-- exported -->\n  <path d=\"M0 0h1\"/>\n</svg>\n",
    );
    write(dir.path(), "src/assets/img/anim.gif", "GIF89a");
    let (runner, _) = runner(dir.path(), BuildMode::Development);

    runner.run(TaskId::Img).await.unwrap();

    assert_eq!(
        read(dir.path().join("public/img/logo.svg")),
        "<svg xmlns=\"http://www.w3.org/2000/svg\"><path d=\"M0 0h1\"/></svg>"
    );
    assert_eq!(read(dir.path().join("public/img/anim.gif")), "GIF89a");
}

#[tokio::test]
async fn test_watch_survives_a_broken_stylesheet() {
    let dir = project();
    let (runner, notifier) = runner(dir.path(), BuildMode::Development);
    let config = BuildConfig::load(dir.path(), BuildMode::Development).unwrap();
    let watch = Watch::new(&config).unwrap();

    let scss = write(dir.path(), "src/styles/style.scss", ".a { color: ");
    let js = dir.path().join("src/js/a.js");

    let outcomes = watch.handle_changes(&runner, dir.path(), &[scss.clone(), js]).await;
    assert_eq!(outcomes, vec![(TaskId::Styles, false), (TaskId::Scripts, true)]);
    assert_eq!(notifier.titles(), vec!["Styles"]);

    // Fixing the file recovers on the next change
    write(dir.path(), "src/styles/style.scss", ".a { color: blue; }\n");
    let outcomes = watch.handle_changes(&runner, dir.path(), &[scss]).await;
    assert_eq!(outcomes, vec![(TaskId::Styles, true)]);
    assert!(read(dir.path().join("public/style.css")).contains("color: blue"));
}

#[tokio::test]
async fn test_config_file_overrides_output_dir() {
    let dir = project();
    write(dir.path(), ".assetflow.yaml", "output_dir: dist\n");
    let (runner, _) = runner(dir.path(), BuildMode::Development);

    runner.run(TaskId::Scripts).await.unwrap();
    assert!(dir.path().join("dist/script.js").exists());
    assert!(!dir.path().join("public").exists());
}
