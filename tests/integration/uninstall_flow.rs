use molly_installer::constants::MACOS_BUNDLE_NAME;
use molly_installer::installer::{Installer, SUCCESS_TITLE, UNINSTALL_SUCCESS_DETAIL, uninstall};

use crate::common::{FakeFetcher, FakePlatform, FakeRegistry, TestHome, publish_release, session_for, test_config};

#[tokio::test]
async fn test_uninstall_removes_everything_even_with_files_missing() {
    let home = TestHome::new();
    let root = home.install_root();
    std::fs::create_dir_all(root.join("tmp")).unwrap();
    for name in ["mollywallet", "update", "store.db", "wallet.log", "cl-wallet.jar"] {
        std::fs::write(root.join(name), name).unwrap();
    }
    std::fs::create_dir_all(home.staging().join("new_build")).unwrap();

    let (session, observer, progress, task) = session_for(&home, "linux", test_config());
    let report = uninstall(&session).await;
    progress.close().await;
    task.join().await;

    assert!(report.failures.is_empty(), "{:?}", report.failures);
    assert!(!root.exists());
    assert!(!home.staging().exists());
    assert!(report.removed.contains(&root.join("store.db")));

    assert!(observer.errors().is_empty());
    assert_eq!(
        observer.successes(),
        vec![(SUCCESS_TITLE.to_string(), UNINSTALL_SUCCESS_DETAIL.to_string())]
    );
    assert_eq!(observer.percents(), vec![0, 100]);
}

#[tokio::test]
async fn test_uninstall_with_nothing_installed_still_succeeds() {
    let home = TestHome::new();

    let (session, observer, progress, task) = session_for(&home, "linux", test_config());
    let report = uninstall(&session).await;
    progress.close().await;
    task.join().await;

    assert!(report.removed.is_empty());
    assert!(report.failures.is_empty());
    assert_eq!(observer.successes().len(), 1);
}

#[tokio::test]
async fn test_uninstall_keeps_unknown_files() {
    let home = TestHome::new();
    let root = home.install_root();
    std::fs::create_dir_all(&root).unwrap();
    std::fs::write(root.join("mollywallet"), b"wallet").unwrap();
    std::fs::write(root.join("backup.key"), b"user data").unwrap();

    let (session, _observer, progress, task) = session_for(&home, "linux", test_config());
    uninstall(&session).await;
    progress.close().await;
    task.join().await;

    assert!(!root.join("mollywallet").exists());
    assert!(root.join("backup.key").exists());
}

#[tokio::test]
async fn test_uninstall_after_install_leaves_no_trace() {
    let home = TestHome::new();
    let fetcher = FakeFetcher::default();
    publish_release(&fetcher, "1.1.9", "windows");

    let (mut session, observer, progress, task) = session_for(&home, "windows", test_config());
    let installer = Installer::new(FakeRegistry::version("1.1.9"), fetcher, FakePlatform::default());
    installer.install(&mut session).await.unwrap();
    let copies = session.profile.shortcut_copies();
    assert!(copies.iter().all(|c| c.exists()));

    // The install run closes its reporter, so uninstall gets a fresh one.
    progress.close().await;
    task.join().await;
    assert_eq!(observer.successes().len(), 1);

    let (session, observer, progress, task) = session_for(&home, "windows", test_config());
    let report = uninstall(&session).await;
    progress.close().await;
    task.join().await;

    assert!(report.failures.is_empty(), "{:?}", report.failures);
    assert!(!home.install_root().exists());
    assert!(copies.iter().all(|c| !c.exists()));
    assert_eq!(observer.successes().len(), 1);
}

#[cfg(unix)]
#[tokio::test]
async fn test_uninstall_reports_each_failure_and_still_succeeds() {
    let home = TestHome::new();
    // A regular file where the install root belongs makes every removal inside it fail.
    std::fs::write(home.install_root(), b"not a directory").unwrap();

    let (session, observer, progress, task) = session_for(&home, "linux", test_config());
    let report = uninstall(&session).await;
    progress.close().await;
    task.join().await;

    assert!(!report.failures.is_empty());
    let errors = observer.errors();
    assert_eq!(errors.len(), report.failures.len());
    assert!(errors.iter().all(|(title, _)| title == "Unable to remove file"));
    assert!(errors.iter().any(|(_, detail)| detail.contains("store.db")));
    assert_eq!(observer.successes().len(), 1);
}

#[tokio::test]
async fn test_darwin_uninstall_removes_application_bundle() {
    let home = TestHome::new();
    let bundle_dir = home.path().join("Applications").join(MACOS_BUNDLE_NAME);
    std::fs::create_dir_all(bundle_dir.join("Contents").join("MacOS")).unwrap();
    std::fs::write(bundle_dir.join("Contents").join("MacOS").join("mollywallet"), b"wallet").unwrap();
    let root = home.install_root();
    std::fs::create_dir_all(&root).unwrap();
    std::fs::write(root.join("mollywallet"), b"wallet").unwrap();

    let (mut session, observer, progress, task) = session_for(&home, "macos", test_config());
    session.profile.application_bundle_dir = Some(bundle_dir.clone());
    let report = uninstall(&session).await;
    progress.close().await;
    task.join().await;

    assert!(report.failures.is_empty(), "{:?}", report.failures);
    assert!(report.removed.contains(&bundle_dir));
    assert!(!bundle_dir.exists());
    assert!(home.path().join("Applications").exists());
    assert!(!root.exists());
    assert_eq!(observer.successes().len(), 1);
}
