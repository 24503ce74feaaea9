fn main() {
    println!("cargo:rerun-if-env-changed=GLYPHFALL_BUILD");
    println!("cargo:rerun-if-env-changed=GITHUB_SHA");

    let build_id = match std::env::var("GLYPHFALL_BUILD") {
        Ok(v) if !v.is_empty() => v,
        _ => infer_build_id(),
    };
    println!("cargo:rustc-env=GLYPHFALL_BUILD={}", build_id);

    let sha = env_short_sha("GITHUB_SHA").unwrap_or_default();
    println!("cargo:rustc-env=GLYPHFALL_GIT_SHA={}", sha);
}

fn env_short_sha(name: &str) -> Option<String> {
    let v = std::env::var(name).ok()?;
    let v = v.trim();
    if v.is_empty() {
        return None;
    }
    let n = v.len().min(7);
    let short = &v[..n];
    if short.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(short.to_ascii_lowercase())
    } else {
        None
    }
}

fn infer_build_id() -> String {
    let os_raw = std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_else(|_| "unknown".to_string());
    let os = match os_raw.as_str() {
        "macos" => "darwin",
        other => other,
    };
    let arch = std::env::var("CARGO_CFG_TARGET_ARCH").unwrap_or_else(|_| "unknown".to_string());
    format!("{os}-{arch}")
}
