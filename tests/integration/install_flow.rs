use std::time::Duration;

use molly_installer::constants::MACOS_BUNDLE_NAME;
use molly_installer::core::{FilesystemError, InstallerError};
use molly_installer::installer::{InstallStage, Installer, PipelineError, SUCCESS_TITLE};

use crate::common::{
    FakeFetcher, FakePlatform, FakeRegistry, TestHome, build_zip, publish, publish_release, publish_sdk,
    session_for, sha256_hex, test_config,
};

#[tokio::test]
async fn test_fresh_install_runs_every_stage() {
    let home = TestHome::new();
    let fetcher = FakeFetcher::default();
    publish_release(&fetcher, "1.1.9", "linux");
    let platform = FakePlatform::default();

    let (mut session, observer, progress, task) = session_for(&home, "linux", test_config());
    let installer = Installer::new(FakeRegistry::version("1.1.9"), fetcher.clone(), platform.clone());
    let report = installer.install(&mut session).await.unwrap();
    progress.close().await;
    task.join().await;

    assert_eq!(report.version, "1.1.9");
    assert!(report.warnings.is_empty(), "unexpected warnings: {:?}", report.warnings);
    assert_eq!(session.resolved_version.as_deref(), Some("1.1.9"));

    let root = home.install_root();
    assert_eq!(std::fs::read(root.join("mollywallet")).unwrap(), b"new wallet");
    assert_eq!(std::fs::read(root.join("update")).unwrap(), b"new updater");
    assert_eq!(std::fs::read(root.join("cl-keytool.jar")).unwrap(), b"keytool jar");
    assert!(root.join("cl-wallet.jar").exists());
    assert!(!home.staging().exists(), "staging should be removed");

    let expected: Vec<u8> = InstallStage::ALL.iter().map(|s| s.checkpoint()).collect();
    assert_eq!(observer.percents(), expected);
    assert_eq!(observer.successes().len(), 1);
    assert_eq!(observer.successes()[0].0, SUCCESS_TITLE);
    assert!(observer.errors().is_empty());

    assert_eq!(platform.launches(), vec![root.join("mollywallet")]);
    assert_eq!(platform.runtime_installs(), 0);

    let requests = fetcher.requests();
    assert_eq!(
        requests[..2],
        [
            "https://dl.test/releases/download/v1.1.9-linux/mollywallet.zip".to_string(),
            "https://dl.test/releases/download/v1.1.9-linux/checksum.sha256".to_string(),
        ]
    );
    assert_eq!(requests.len(), 4);
}

#[tokio::test]
async fn test_update_replaces_binary_and_keeps_wallet_data() {
    let home = TestHome::new();
    let root = home.install_root();
    std::fs::create_dir_all(&root).unwrap();
    std::fs::write(root.join("mollywallet"), b"old wallet").unwrap();
    std::fs::write(root.join("store.db"), b"keys").unwrap();
    std::fs::write(root.join("wallet.log"), b"log").unwrap();

    let fetcher = FakeFetcher::default();
    publish_release(&fetcher, "1.2.0", "linux");

    let (mut session, _observer, progress, task) = session_for(&home, "linux", test_config());
    let installer = Installer::new(FakeRegistry::version("1.2.0"), fetcher, FakePlatform::default());
    installer.install(&mut session).await.unwrap();
    progress.close().await;
    task.join().await;

    assert_eq!(std::fs::read(root.join("mollywallet")).unwrap(), b"new wallet");
    assert_eq!(std::fs::read(root.join("store.db")).unwrap(), b"keys");
    assert!(root.join("wallet.log").exists());
}

#[tokio::test]
async fn test_checksum_mismatch_aborts_before_extraction() {
    let home = TestHome::new();
    let fetcher = FakeFetcher::default();
    let archive = build_zip(&[("mollywallet", b"tampered"), ("update", b"updater")]);
    publish(&fetcher, "1.1.9", "linux", &archive, format!("{}\n", "0".repeat(64)));
    let platform = FakePlatform::default();

    let (mut session, observer, progress, task) = session_for(&home, "linux", test_config());
    let installer = Installer::new(FakeRegistry::version("1.1.9"), fetcher, platform.clone());
    let error = installer.install(&mut session).await.unwrap_err();
    progress.close().await;
    task.join().await;

    assert_eq!(error.stage(), InstallStage::VerifyChecksum);
    match error {
        PipelineError::Aborted {
            source: InstallerError::ChecksumMismatch { expected, actual },
            ..
        } => {
            assert_eq!(expected, "0".repeat(64));
            assert_eq!(actual, sha256_hex(&archive));
        }
        other => panic!("expected checksum mismatch, got {other:?}"),
    }

    assert!(!home.install_root().join("mollywallet").exists());
    assert!(!home.staging().join("new_build").exists());
    assert!(observer.successes().is_empty());
    assert_eq!(observer.errors().len(), 1);
    assert_eq!(observer.percents().last(), Some(&InstallStage::VerifyChecksum.checkpoint()));
    assert!(platform.launches().is_empty());
}

#[tokio::test]
async fn test_missing_update_helper_is_fatal() {
    let home = TestHome::new();
    let fetcher = FakeFetcher::default();
    let archive = build_zip(&[("mollywallet", b"new wallet")]);
    publish(&fetcher, "1.1.9", "linux", &archive, sha256_hex(&archive));
    let mut config = test_config();
    config.sdk.enabled = false;

    let (mut session, observer, progress, task) = session_for(&home, "linux", config);
    let installer = Installer::new(FakeRegistry::version("1.1.9"), fetcher, FakePlatform::default());
    let error = installer.install(&mut session).await.unwrap_err();
    progress.close().await;
    task.join().await;

    assert_eq!(error.stage(), InstallStage::ReplaceBinaries);
    assert!(matches!(
        error,
        PipelineError::Aborted {
            source: InstallerError::Filesystem(FilesystemError::MissingArtifact { .. }),
            ..
        }
    ));
    assert!(!home.install_root().join("mollywallet").exists());
    assert!(observer.successes().is_empty());
}

#[tokio::test]
async fn test_sdk_failure_is_reported_and_skipped() {
    let home = TestHome::new();
    let fetcher = FakeFetcher::default();
    let archive = build_zip(&[("mollywallet", b"new wallet"), ("update", b"new updater")]);
    publish(&fetcher, "1.1.9", "linux", &archive, sha256_hex(&archive));

    let (mut session, observer, progress, task) = session_for(&home, "linux", test_config());
    let installer = Installer::new(FakeRegistry::version("1.1.9"), fetcher, FakePlatform::default());
    let report = installer.install(&mut session).await.unwrap();
    progress.close().await;
    task.join().await;

    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].stage, InstallStage::FetchSdk);
    assert!(report.warnings[0].message.contains("cl-keytool.jar"));

    assert_eq!(observer.errors().len(), 1);
    assert_eq!(observer.errors()[0].0, InstallStage::FetchSdk.failure_title());
    assert_eq!(observer.successes().len(), 1);
    assert!(home.install_root().join("mollywallet").exists());
}

#[tokio::test]
async fn test_sdk_and_launch_can_be_disabled() {
    let home = TestHome::new();
    let fetcher = FakeFetcher::default();
    let archive = build_zip(&[("mollywallet", b"new wallet"), ("update", b"new updater")]);
    publish(&fetcher, "1.1.9", "linux", &archive, sha256_hex(&archive));
    let platform = FakePlatform::default();
    let mut config = test_config();
    config.sdk.enabled = false;
    config.launch_after_install = false;

    let (mut session, observer, progress, task) = session_for(&home, "linux", config);
    let installer = Installer::new(FakeRegistry::version("1.1.9"), fetcher.clone(), platform.clone());
    installer.install(&mut session).await.unwrap();
    progress.close().await;
    task.join().await;

    let percents = observer.percents();
    assert!(!percents.contains(&InstallStage::FetchSdk.checkpoint()));
    assert!(!percents.contains(&InstallStage::LaunchApplication.checkpoint()));
    assert_eq!(percents.last(), Some(&100));
    assert!(platform.launches().is_empty());
    assert_eq!(fetcher.requests().len(), 2);
}

#[tokio::test]
async fn test_unsupported_os_fails_before_any_download() {
    let home = TestHome::new();
    let fetcher = FakeFetcher::default();

    let (mut session, observer, progress, task) = session_for(&home, "plan9", test_config());
    let installer = Installer::new(FakeRegistry::version("1.1.9"), fetcher.clone(), FakePlatform::default());
    let error = installer.install(&mut session).await.unwrap_err();
    progress.close().await;
    task.join().await;

    assert_eq!(error.stage(), InstallStage::PrepareFilesystem);
    assert!(matches!(
        error,
        PipelineError::Aborted {
            source: InstallerError::UnsupportedPlatform(_),
            ..
        }
    ));
    assert!(fetcher.requests().is_empty());
    assert_eq!(observer.errors().len(), 1);
}

#[tokio::test]
async fn test_registry_failure_aborts_at_resolve() {
    let home = TestHome::new();
    let fetcher = FakeFetcher::default();

    let (mut session, observer, progress, task) = session_for(&home, "linux", test_config());
    let installer = Installer::new(FakeRegistry::failing(), fetcher.clone(), FakePlatform::default());
    let error = installer.install(&mut session).await.unwrap_err();
    progress.close().await;
    task.join().await;

    assert_eq!(error.stage(), InstallStage::ResolveVersion);
    assert!(session.resolved_version.is_none());
    assert!(fetcher.requests().is_empty());
    assert_eq!(observer.errors()[0].0, InstallStage::ResolveVersion.failure_title());
}

#[tokio::test(start_paused = true)]
async fn test_fatal_failure_pauses_before_returning() {
    let home = TestHome::new();
    let mut config = test_config();
    config.fatal_pause_secs = 10;

    let (mut session, _observer, progress, task) = session_for(&home, "linux", config);
    let installer = Installer::new(FakeRegistry::failing(), FakeFetcher::default(), FakePlatform::default());
    let start = tokio::time::Instant::now();
    installer.install(&mut session).await.unwrap_err();
    assert!(start.elapsed() >= Duration::from_secs(10));

    progress.close().await;
    task.join().await;
}

#[tokio::test]
async fn test_cancelled_token_stops_the_run() {
    let home = TestHome::new();
    let fetcher = FakeFetcher::default();
    publish_release(&fetcher, "1.1.9", "linux");

    let (mut session, observer, progress, task) = session_for(&home, "linux", test_config());
    let installer = Installer::new(FakeRegistry::version("1.1.9"), fetcher.clone(), FakePlatform::default());
    installer.cancellation_token().cancel();
    let error = installer.install(&mut session).await.unwrap_err();
    progress.close().await;
    task.join().await;

    assert!(matches!(
        error,
        PipelineError::Cancelled {
            stage: InstallStage::CheckRuntimeDependency
        }
    ));
    assert!(fetcher.requests().is_empty());
    assert!(observer.successes().is_empty());
    assert_eq!(observer.errors().len(), 1);
}

#[tokio::test]
async fn test_windows_bootstraps_runtime_and_creates_shortcuts() {
    let home = TestHome::new();
    let fetcher = FakeFetcher::default();
    publish_release(&fetcher, "1.1.9", "windows");
    let platform = FakePlatform::default();

    let (mut session, observer, progress, task) = session_for(&home, "windows", test_config());
    let installer = Installer::new(FakeRegistry::version("1.1.9"), fetcher.clone(), platform.clone());
    installer.install(&mut session).await.unwrap();
    progress.close().await;
    task.join().await;

    assert_eq!(platform.runtime_installs(), 1);
    let root = home.install_root();
    assert!(root.join("mollywallet.exe").exists());
    assert!(root.join("update.exe").exists());
    assert!(fetcher.requests()[0].ends_with("/v1.1.9-windows/mollywallet.zip"));

    let profile = &session.profile;
    assert!(profile.shortcut_file_path.exists());
    for copy in profile.shortcut_copies() {
        assert!(copy.exists(), "missing shortcut copy {}", copy.display());
    }
    assert_eq!(observer.successes().len(), 1);
}

#[tokio::test]
async fn test_windows_runtime_install_failure_is_fatal() {
    let home = TestHome::new();
    let fetcher = FakeFetcher::default();
    let platform = FakePlatform {
        runtime_install_fails: true,
        ..FakePlatform::default()
    };

    let (mut session, _observer, progress, task) = session_for(&home, "windows", test_config());
    let installer = Installer::new(FakeRegistry::version("1.1.9"), fetcher.clone(), platform);
    let error = installer.install(&mut session).await.unwrap_err();
    progress.close().await;
    task.join().await;

    assert_eq!(error.stage(), InstallStage::CheckRuntimeDependency);
    assert!(matches!(
        error,
        PipelineError::Aborted {
            source: InstallerError::DependencyInstall(_),
            ..
        }
    ));
    assert!(fetcher.requests().is_empty());
    assert!(!home.install_root().exists());
}

#[tokio::test]
async fn test_windows_skips_bootstrap_when_runtime_present() {
    let home = TestHome::new();
    let fetcher = FakeFetcher::default();
    publish_release(&fetcher, "1.1.9", "windows");
    let platform = FakePlatform {
        runtime_present: true,
        ..FakePlatform::default()
    };

    let (mut session, _observer, progress, task) = session_for(&home, "windows", test_config());
    let installer = Installer::new(FakeRegistry::version("1.1.9"), fetcher, platform.clone());
    installer.install(&mut session).await.unwrap();
    progress.close().await;
    task.join().await;

    assert_eq!(platform.runtime_installs(), 0);
}

#[cfg(unix)]
#[tokio::test]
async fn test_prepare_failure_aborts_with_every_failed_path() {
    let home = TestHome::new();
    // A regular file where the install root belongs makes every removal inside it fail.
    std::fs::write(home.install_root(), b"not a directory").unwrap();

    let (mut session, _observer, progress, task) = session_for(&home, "linux", test_config());
    let installer = Installer::new(FakeRegistry::version("1.1.9"), FakeFetcher::default(), FakePlatform::default());
    let error = installer.install(&mut session).await.unwrap_err();
    progress.close().await;
    task.join().await;

    assert_eq!(error.stage(), InstallStage::PrepareFilesystem);
    match error {
        PipelineError::Aborted {
            source: InstallerError::Filesystem(FilesystemError::Removal { failures }),
            ..
        } => {
            assert!(failures.len() > 1);
            assert!(failures.iter().any(|f| f.path.ends_with("mollywallet")));
            assert!(failures.iter().any(|f| f.path.ends_with("mollywallet.zip")));
        }
        other => panic!("expected removal failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_darwin_install_copies_bundle_and_launches_it() {
    let home = TestHome::new();
    let bundle_dir = home.path().join("Applications").join(MACOS_BUNDLE_NAME);
    std::fs::create_dir_all(&bundle_dir).unwrap();
    std::fs::write(bundle_dir.join("stale.txt"), b"from an older release").unwrap();

    let bundle_binary = format!("{MACOS_BUNDLE_NAME}/Contents/MacOS/mollywallet");
    let bundle_plist = format!("{MACOS_BUNDLE_NAME}/Contents/Info.plist");
    let archive = build_zip(&[
        ("mollywallet", b"new wallet"),
        ("update", b"new updater"),
        (bundle_binary.as_str(), b"bundled wallet"),
        (bundle_plist.as_str(), b"<plist/>"),
    ]);
    let fetcher = FakeFetcher::default();
    publish(&fetcher, "1.1.9", "macos", &archive, sha256_hex(&archive));
    publish_sdk(&fetcher);
    let platform = FakePlatform::default();

    let (mut session, _observer, progress, task) = session_for(&home, "macos", test_config());
    session.profile.application_bundle_dir = Some(bundle_dir.clone());
    let installer = Installer::new(FakeRegistry::version("1.1.9"), fetcher.clone(), platform.clone());
    let report = installer.install(&mut session).await.unwrap();
    progress.close().await;
    task.join().await;

    assert!(report.warnings.is_empty(), "unexpected warnings: {:?}", report.warnings);
    assert!(fetcher.requests()[0].ends_with("/v1.1.9-darwin/mollywallet.zip"));

    let launched = bundle_dir.join("Contents").join("MacOS").join("mollywallet");
    assert_eq!(std::fs::read(&launched).unwrap(), b"bundled wallet");
    assert!(bundle_dir.join("Contents").join("Info.plist").exists());
    assert!(!bundle_dir.join("stale.txt").exists(), "prepare should clear the old bundle");
    assert_eq!(platform.launches(), vec![launched]);
    assert!(home.install_root().join("mollywallet").exists());
}

#[tokio::test]
async fn test_darwin_launch_falls_back_without_bundle_in_package() {
    let home = TestHome::new();
    let bundle_dir = home.path().join("Applications").join(MACOS_BUNDLE_NAME);
    let fetcher = FakeFetcher::default();
    publish_release(&fetcher, "1.1.9", "macos");
    let platform = FakePlatform::default();

    let (mut session, _observer, progress, task) = session_for(&home, "macos", test_config());
    session.profile.application_bundle_dir = Some(bundle_dir.clone());
    let installer = Installer::new(FakeRegistry::version("1.1.9"), fetcher, platform.clone());
    let report = installer.install(&mut session).await.unwrap();
    progress.close().await;
    task.join().await;

    // A missing bundle is reported and skipped; the plain binary is launched instead.
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].stage, InstallStage::ReplaceBinaries);
    assert!(!bundle_dir.exists());
    assert_eq!(platform.launches(), vec![home.install_root().join("mollywallet")]);
}

#[tokio::test(start_paused = true)]
async fn test_locked_binary_aborts_after_full_retry_schedule() {
    let home = TestHome::new();
    let fetcher = FakeFetcher::default();
    publish_release(&fetcher, "1.1.9", "linux");
    let platform = FakePlatform::default();
    let mut config = test_config();
    config.sdk.enabled = false;

    let (mut session, observer, progress, task) = session_for(&home, "linux", config);
    // A directory in place of the binary makes every copy attempt fail.
    let busy = home.path().join("busy");
    std::fs::create_dir_all(busy.join("held-open")).unwrap();
    session.profile.install_binary_path = busy.clone();

    let installer = Installer::new(FakeRegistry::version("1.1.9"), fetcher, platform.clone());
    let start = tokio::time::Instant::now();
    let error = installer.install(&mut session).await.unwrap_err();
    let elapsed = start.elapsed();
    progress.close().await;
    task.join().await;

    assert_eq!(error.stage(), InstallStage::ReplaceBinaries);
    assert!(matches!(
        error,
        PipelineError::Aborted {
            source: InstallerError::Filesystem(FilesystemError::Copy { .. }),
            ..
        }
    ));
    assert!(elapsed >= Duration::from_secs(14), "slept {elapsed:?}");
    assert!(elapsed < Duration::from_secs(15), "slept {elapsed:?}");
    assert!(busy.is_dir());
    assert!(platform.launches().is_empty());
    assert!(observer.successes().is_empty());
}
