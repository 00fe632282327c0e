use pixmod_core::{PixelBuffer, Rgba};
use std::path::Path;
use std::process::{Command, Output};

fn pixmod(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pixmod"))
        .args(args)
        .output()
        .expect("run pixmod")
}

fn write_input(path: &Path, buf: &PixelBuffer) {
    pixmod_io::write(path, buf).expect("write input");
}

fn arg(path: &Path) -> &str {
    path.to_str().expect("utf-8 path")
}

#[test]
fn grey_writes_output() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("in.png");
    let output = dir.path().join("out.png");
    write_input(&input, &PixelBuffer::filled(3, 2, Rgba::opaque(255, 0, 0)).expect("buffer"));

    let out = pixmod(&["grey", arg(&input), arg(&output)]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let result = pixmod_io::read(&output).expect("read output");
    assert!(result.pixels().all(|(_, _, p)| p == Rgba::opaque(76, 76, 76)));
}

#[test]
fn emboss_black_square() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("black.png");
    let output = dir.path().join("relief.png");
    write_input(&input, &PixelBuffer::filled(2, 2, Rgba::BLACK).expect("buffer"));

    let out = pixmod(&["emboss", arg(&input), arg(&output), "--edge", "mirror"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let result = pixmod_io::read(&output).expect("read output");
    assert!(result.pixels().all(|(_, _, p)| p == Rgba::new(128, 128, 128, 255)));
}

#[test]
fn unknown_operation_fails_without_output() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("in.png");
    let output = dir.path().join("out.png");
    write_input(&input, &PixelBuffer::filled(2, 2, Rgba::WHITE).expect("buffer"));

    let out = pixmod(&["sharpen", arg(&input), arg(&output)]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("The operation sharpen is not available"), "{stderr}");
    assert!(!output.exists());
}

#[test]
fn missing_input_fails_without_output() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("missing.png");
    let output = dir.path().join("out.png");

    let out = pixmod(&["blur", arg(&input), arg(&output)]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("could not be loaded"));
    assert!(!output.exists());
}

#[test]
fn bad_sigma_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("in.png");
    let output = dir.path().join("out.png");
    write_input(&input, &PixelBuffer::filled(2, 2, Rgba::WHITE).expect("buffer"));

    let out = pixmod(&["blur", arg(&input), arg(&output), "--sigma", "0"]);
    assert!(!out.status.success());
    assert!(!output.exists());
}

#[test]
fn bad_edge_mode_is_a_usage_error() {
    let out = pixmod(&["blur", "a.png", "b.png", "--edge", "zero"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("unknown edge mode"));
}
