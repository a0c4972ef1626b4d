mod common;

use common::{foreign_uname, host_uname, parse_json, stderr_text, Workspace};

#[test]
fn dry_run_prints_single_arch_command() {
    let Some(host) = host_uname() else {
        return;
    };
    let ws = Workspace::new("cbi-dry-run");
    let assert = ws
        .cbi()
        .args(["--disable-multiarch", "--dry-run"])
        .assert()
        .success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    assert!(stdout.contains("would run"), "missing preview: {stdout}");
    assert!(stdout.contains("--manifest localhost/clang-toolchain:17"));
    assert!(stdout.contains("CLANG_BUILD=SKIP"));
    assert!(stdout.contains(host), "plan table missing host: {stdout}");
    assert!(!ws.bud_log.exists());
}

#[test]
fn json_dry_run_reports_plan() {
    let Some(host) = host_uname() else {
        return;
    };
    let ws = Workspace::new("cbi-json");
    ws.enable_emulation(foreign_uname(host));
    let assert = ws.cbi().args(["--dry-run", "--json"]).assert().success();
    let payload = parse_json(&assert);
    assert_eq!(payload["status"], "ok");
    let plan = &payload["details"]["plan"];
    assert_eq!(plan["multiarch_enabled"], true);
    assert_eq!(
        plan["platforms"],
        serde_json::json!(["x86_64", "aarch64"])
    );
    assert_eq!(plan["clang_build_mode"], "SKIP");
    let args = payload["details"]["command"]["args"]
        .as_array()
        .expect("args");
    assert_eq!(
        args.iter().filter(|arg| *arg == "--platform").count(),
        2
    );
}

#[test]
fn invalid_mode_exits_one() {
    if host_uname().is_none() {
        return;
    }
    let ws = Workspace::new("cbi-mode");
    let assert = ws
        .cbi()
        .args(["--clang-build-mode", "install", "--disable-multiarch"])
        .assert()
        .code(1);
    let stderr = stderr_text(&assert);
    assert_eq!(
        stderr.matches("invalid clang build mode `install`").count(),
        1,
        "failure should be reported once: {stderr}"
    );
    assert!(stderr.contains("Hint: use one of SKIP, INSTALL, INSTALL_FROM"));
    assert!(!ws.bud_log.exists());
}

#[test]
fn multiarch_without_emulation_is_rejected() {
    let Some(host) = host_uname() else {
        return;
    };
    let ws = Workspace::new("cbi-emulation");
    let assert = ws.cbi().arg("--json").assert().code(1);
    let payload = parse_json(&assert);
    assert_eq!(payload["status"], "user-error");
    assert_eq!(payload["details"]["code"], "CBI111");
    assert_eq!(payload["details"]["arch"], foreign_uname(host));
}

#[test]
fn published_image_is_not_rebuilt() {
    if host_uname().is_none() {
        return;
    }
    let ws = Workspace::new("cbi-published");
    let assert = ws
        .cbi()
        .env("FAKE_REG_DIGEST", "sha256:feedface")
        .args(["--disable-multiarch", "--json"])
        .assert()
        .code(1);
    let payload = parse_json(&assert);
    assert_eq!(payload["details"]["code"], "CBI102");
    assert!(!ws.bud_log.exists());

    ws.cbi()
        .env("FAKE_REG_DIGEST", "sha256:feedface")
        .env("CBI_SKIP_REGISTRY_CHECK", "1")
        .args(["--disable-multiarch", "--dry-run"])
        .assert()
        .success();
}

#[test]
fn old_buildah_is_rejected() {
    if host_uname().is_none() {
        return;
    }
    let ws = Workspace::new("cbi-old-buildah");
    let assert = ws
        .cbi()
        .env("FAKE_BUILDAH_VERSION", "1.19.2")
        .args(["--disable-multiarch", "--json"])
        .assert()
        .code(1);
    let payload = parse_json(&assert);
    assert_eq!(payload["details"]["code"], "CBI101");
    assert_eq!(payload["details"]["found"], "1.19.2");
}

#[test]
fn install_from_rejects_archive_outside_root() {
    let Some(host) = host_uname() else {
        return;
    };
    let ws = Workspace::new("cbi-escape");
    let flag = format!("--clang-archive-{host}");
    let assert = ws
        .cbi()
        .args([
            "--clang-build-mode",
            "INSTALL_FROM",
            "--disable-multiarch",
            "--json",
            flag.as_str(),
            "../outside.tar.gz",
        ])
        .assert()
        .code(1);
    let payload = parse_json(&assert);
    assert_eq!(payload["details"]["code"], "CBI113");
}

#[cfg(unix)]
#[test]
fn install_from_rejects_symlink_leading_outside_root() {
    let Some(host) = host_uname() else {
        return;
    };
    let ws = Workspace::new("cbi-symlink");
    let outside = ws.temp.path().join("outside.tar.gz");
    std::fs::write(&outside, b"archive").expect("outside archive");
    ws.link("archives/clang.tar.gz", &outside);
    let flag = format!("--clang-archive-{host}");
    let assert = ws
        .cbi()
        .args([
            "--clang-build-mode",
            "INSTALL_FROM",
            "--disable-multiarch",
            "--dry-run",
            "--json",
            flag.as_str(),
            "archives/clang.tar.gz",
        ])
        .assert()
        .code(1);
    let payload = parse_json(&assert);
    assert_eq!(payload["details"]["code"], "CBI113");
    assert_eq!(payload["details"]["path"], "../outside.tar.gz");
}

#[cfg(unix)]
#[test]
fn install_from_accepts_symlink_inside_root() {
    let Some(host) = host_uname() else {
        return;
    };
    let ws = Workspace::new("cbi-symlink-inside");
    ws.touch("store/clang.tar.gz");
    ws.link("archives/clang.tar.gz", &ws.root.join("store/clang.tar.gz"));
    let flag = format!("--clang-archive-{host}");
    let assert = ws
        .cbi()
        .args([
            "--clang-build-mode",
            "INSTALL_FROM",
            "--disable-multiarch",
            "--dry-run",
            "--json",
            flag.as_str(),
            "archives/clang.tar.gz",
        ])
        .assert()
        .success();
    let payload = parse_json(&assert);
    assert_eq!(
        payload["details"]["plan"]["archive_spec"][host],
        "store/clang.tar.gz"
    );
}

#[test]
fn install_rejects_build_root_as_archive() {
    let Some(host) = host_uname() else {
        return;
    };
    let ws = Workspace::new("cbi-install-root");
    let flag = format!("--clang-archive-{host}");
    let assert = ws
        .cbi()
        .args(["--clang-build-mode", "INSTALL", "--json", flag.as_str(), "."])
        .assert()
        .code(1);
    assert_eq!(parse_json(&assert)["details"]["code"], "CBI113");
    assert!(!ws.bud_log.exists());
}

#[test]
fn install_from_builds_with_archives() {
    let Some(host) = host_uname() else {
        return;
    };
    let ws = Workspace::new("cbi-install-from");
    ws.touch("archives/clang.tar.gz");
    let flag = format!("--clang-archive-{host}");
    ws.cbi()
        .args([
            "--clang-build-mode",
            "INSTALL_FROM",
            "--disable-multiarch",
            flag.as_str(),
            "archives/clang.tar.gz",
        ])
        .assert()
        .success();
    let args = ws.bud_args();
    assert_eq!(args.first().map(String::as_str), Some("bud"));
    assert!(args.contains(&"CLANG_BUILD=INSTALL_FROM".to_string()));
    assert!(args.contains(&format!("CLANG_ARCHIVES={host}:archives/clang.tar.gz")));
    let root = ws.root.canonicalize().expect("canonical root");
    assert_eq!(args.last(), Some(&root.display().to_string()));
}

#[test]
fn install_from_reports_missing_archive() {
    let Some(host) = host_uname() else {
        return;
    };
    let ws = Workspace::new("cbi-missing-archive");
    let flag = format!("--clang-archive-{host}");
    let assert = ws
        .cbi()
        .args([
            "--clang-build-mode",
            "INSTALL_FROM",
            "--disable-multiarch",
            "--json",
            flag.as_str(),
            "archives/absent.tar.gz",
        ])
        .assert()
        .code(1);
    assert_eq!(parse_json(&assert)["details"]["code"], "CBI114");
}

#[test]
fn install_prepares_default_archive_directory() {
    let Some(host) = host_uname() else {
        return;
    };
    let ws = Workspace::new("cbi-install");
    ws.cbi()
        .args(["--clang-build-mode", "INSTALL"])
        .assert()
        .success();
    assert!(ws.root.join("clang-archives").is_dir());
    let args = ws.bud_args();
    assert_eq!(
        args.iter().filter(|arg| *arg == "--platform").count(),
        1
    );
    assert!(args.contains(&format!(
        "CLANG_ARCHIVES={host}:clang-archives/clang-17-localhost-clang-toolchain-17-{host}.tar.gz"
    )));
}

#[test]
fn builder_exit_code_is_forwarded() {
    if host_uname().is_none() {
        return;
    }
    let ws = Workspace::new("cbi-build-fails");
    let assert = ws
        .cbi()
        .env("FAKE_BUILD_EXIT", "3")
        .arg("--disable-multiarch")
        .assert()
        .code(3);
    let stderr = stderr_text(&assert);
    assert!(
        stderr.contains("buildah exited with status 3"),
        "stderr: {stderr}"
    );
    assert!(!ws.bud_args().is_empty());
}
