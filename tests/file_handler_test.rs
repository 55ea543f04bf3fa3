//! 静态内容解析测试

use tokio::io::AsyncReadExt;

use rat_radio::server::file_handler::{
    content_type_for, ContentResolver, DiskContentResolver, DEFAULT_CONTENT_TYPE,
};

#[tokio::test]
async fn resolves_existing_file_with_type_tag() {
    let dir = tempfile::tempdir().expect("创建临时目录失败");
    std::fs::write(dir.path().join("index.html"), b"<html></html>").unwrap();

    let resolver = DiskContentResolver::new(dir.path());
    let mut handle = resolver.resolve("/index.html").await.expect("解析失败");

    assert_eq!(handle.file_type.as_deref(), Some(".html"));

    let mut content = Vec::new();
    handle.reader.read_to_end(&mut content).await.unwrap();
    assert_eq!(content, b"<html></html>");
}

#[tokio::test]
async fn file_without_extension_has_no_type_tag() {
    let dir = tempfile::tempdir().expect("创建临时目录失败");
    std::fs::write(dir.path().join("blob"), b"raw").unwrap();

    let resolver = DiskContentResolver::new(dir.path());
    let handle = resolver.resolve("/blob").await.expect("解析失败");

    assert!(handle.file_type.is_none());
}

#[tokio::test]
async fn missing_file_maps_to_not_found() {
    let dir = tempfile::tempdir().expect("创建临时目录失败");

    let resolver = DiskContentResolver::new(dir.path());
    let err = resolver.resolve("/missing.png").await.unwrap_err();

    assert!(err.is_not_found(), "缺失文件应映射为 NotFound: {:?}", err);
}

#[tokio::test]
async fn parent_traversal_is_rejected() {
    let dir = tempfile::tempdir().expect("创建临时目录失败");

    let resolver = DiskContentResolver::new(dir.path());
    let err = resolver.resolve("../outside.txt").await.unwrap_err();

    assert!(err.is_not_found(), "越界路径应映射为 NotFound: {:?}", err);
}

#[tokio::test]
async fn directory_identifier_maps_to_not_found() {
    let dir = tempfile::tempdir().expect("创建临时目录失败");
    std::fs::create_dir(dir.path().join("subdir")).unwrap();

    let resolver = DiskContentResolver::new(dir.path());
    let err = resolver.resolve("/subdir").await.unwrap_err();

    assert!(err.is_not_found());
}

#[test]
fn content_type_table_maps_known_extensions() {
    assert_eq!(content_type_for(".html"), "text/html");
    assert_eq!(content_type_for(".css"), "text/css");
    assert_eq!(content_type_for(".js"), "text/javascript");
    assert_eq!(content_type_for(".mp3"), "audio/mpeg");
}

#[test]
fn unknown_extension_falls_back_to_default() {
    assert_eq!(content_type_for(".ext"), DEFAULT_CONTENT_TYPE);
    assert_eq!(content_type_for(""), DEFAULT_CONTENT_TYPE);
}
