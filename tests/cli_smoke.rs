use std::io::Cursor;
use std::path::PathBuf;

fn bin_path() -> PathBuf {
    std::env::var_os("CARGO_BIN_EXE_scoreband")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = PathBuf::from("target").join("debug");
            p.push(if cfg!(windows) {
                "scoreband.exe"
            } else {
                "scoreband"
            });
            p
        })
}

fn write_poster_png(path: &std::path::Path, width: u32, height: u32) {
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for _ in 0..width * height {
        data.extend_from_slice(&[30, 60, 90, 255]);
    }
    let img = image::RgbaImage::from_raw(width, height, data).unwrap();
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    std::fs::write(path, &buf).unwrap();
}

fn run_annotate(dir: &std::path::Path, out: &std::path::Path) -> std::process::Output {
    let poster = dir.join("poster.png");
    let scores = dir.join("scores.json");

    let poster_arg = poster.to_string_lossy().to_string();
    let scores_arg = scores.to_string_lossy().to_string();
    let out_arg = out.to_string_lossy().to_string();
    let logos_arg = dir.to_string_lossy().to_string();

    std::process::Command::new(bin_path())
        .args([
            "annotate",
            "--poster",
            poster_arg.as_str(),
            "--scores",
            scores_arg.as_str(),
            "--out",
            out_arg.as_str(),
            "--font",
            "tests/data/fonts/DejaVuSans.ttf",
            "--logos",
            logos_arg.as_str(),
        ])
        .output()
        .unwrap()
}

const SCORES_JSON: &str = concat!(
    r#"[{"source":"imdb","logo":null,"raw":"7.4"},"#,
    r#"{"source":"trakt","logo":null,"raw":"8.0"}]"#
);

#[test]
fn cli_annotate_writes_png() {
    let dir = PathBuf::from("target").join("cli_smoke_png");
    std::fs::create_dir_all(&dir).unwrap();
    write_poster_png(&dir.join("poster.png"), 200, 300);
    std::fs::write(dir.join("scores.json"), SCORES_JSON).unwrap();

    let out = dir.join("annotated.png");
    let _ = std::fs::remove_file(&out);

    let run = run_annotate(&dir, &out);
    assert!(run.status.success());
    assert!(out.exists());

    let img = image::open(&out).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (200, 300));
}

#[test]
fn cli_annotate_writes_jpeg_without_alpha() {
    let dir = PathBuf::from("target").join("cli_smoke_jpeg");
    std::fs::create_dir_all(&dir).unwrap();
    write_poster_png(&dir.join("poster.png"), 160, 240);
    std::fs::write(dir.join("scores.json"), SCORES_JSON).unwrap();

    let out = dir.join("annotated.jpg");
    let _ = std::fs::remove_file(&out);

    let run = run_annotate(&dir, &out);
    assert!(run.status.success());

    let img = image::open(&out).unwrap();
    assert_eq!(img.color(), image::ColorType::Rgb8);
    assert_eq!(img.to_rgb8().dimensions(), (160, 240));
}

#[test]
fn cli_annotate_rejects_an_unknown_output_extension() {
    let dir = PathBuf::from("target").join("cli_smoke_reject");
    std::fs::create_dir_all(&dir).unwrap();
    write_poster_png(&dir.join("poster.png"), 100, 150);
    std::fs::write(dir.join("scores.json"), SCORES_JSON).unwrap();

    let out = dir.join("annotated.bmp");
    let _ = std::fs::remove_file(&out);

    let run = run_annotate(&dir, &out);
    assert!(!run.status.success());
    assert!(!out.exists());
}

#[test]
fn cli_annotate_rejects_malformed_scores_json() {
    let dir = PathBuf::from("target").join("cli_smoke_bad_json");
    std::fs::create_dir_all(&dir).unwrap();
    write_poster_png(&dir.join("poster.png"), 100, 150);
    std::fs::write(dir.join("scores.json"), r#"[{"source": "imdb""#).unwrap();

    let out = dir.join("annotated.png");
    let _ = std::fs::remove_file(&out);

    let run = run_annotate(&dir, &out);
    assert!(!run.status.success());
    assert!(!out.exists());

    let stderr = String::from_utf8_lossy(&run.stderr);
    assert!(stderr.contains("serialization error"), "stderr: {stderr}");
}
