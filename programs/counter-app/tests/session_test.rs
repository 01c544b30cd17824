use std::sync::Arc;

use counter_app::app::{CounterApp, SessionCommand};
use counter_client::{
    test_utils::{MemoryLedger, TestWallet},
    CounterProgram, CounterSession, Network, ProviderShell, ViewState,
};

const IDL: &str = include_str!("../../../idl/counter.json");

fn program() -> CounterProgram {
    CounterProgram::from_json(IDL).unwrap()
}

fn app_with(wallet: Arc<TestWallet>) -> (Arc<MemoryLedger>, CounterApp) {
    let ledger = Arc::new(MemoryLedger::new(program()));
    let app = app_on(ledger.clone(), wallet, CounterSession::generate());
    (ledger, app)
}

fn app_on(
    ledger: Arc<MemoryLedger>,
    wallet: Arc<TestWallet>,
    session: CounterSession,
) -> CounterApp {
    let shell = ProviderShell::with_ledger(Network::Localnet, ledger, wallet);
    CounterApp::new(shell, program(), session)
}

async fn run_script(app: &CounterApp, script: &str) -> String {
    let mut out = Vec::new();
    app.run_session(script.as_bytes(), &mut out).await.unwrap();
    String::from_utf8(out).unwrap()
}

#[tokio::test]
async fn test_session_walks_through_counter_lifecycle() {
    let (ledger, app) = app_with(Arc::new(TestWallet::new()));

    let output = run_script(
        &app,
        "connect\ncreate\nincrement\n\nincrement\ndecrement\nquit\nincrement\n",
    )
    .await;

    let expected = [
        "Click button to connect wallet\n[ Connect wallet ]\n",
        "[ Create counter ]\n",
        "[ Increment counter ]\n[ Decrement counter ]\n0\n",
        "[ Increment counter ]\n[ Decrement counter ]\n1\n",
        "[ Increment counter ]\n[ Decrement counter ]\n2\n",
        "[ Increment counter ]\n[ Decrement counter ]\n1\n",
    ]
    .concat();
    assert_eq!(output, expected);

    // Nothing after `quit` runs.
    assert_eq!(
        ledger.count(&app.panel().session().address()).await,
        Some(1)
    );
}

#[tokio::test]
async fn test_session_reports_errors_and_continues() {
    let (_, app) = app_with(TestWallet::connected().await);

    let output = run_script(&app, "create\ndecrement\nfrobnicate\nincrement\n").await;

    assert!(output.contains("error: "));
    assert!(output.contains("CounterUnderflow"));
    assert!(output.contains("unknown command `frobnicate`"));
    assert!(output.ends_with("[ Increment counter ]\n[ Decrement counter ]\n1\n"));
    assert_eq!(app.panel().display_value().await, Some(1));
}

#[tokio::test]
async fn test_session_disconnect_hides_counter() {
    let (_, app) = app_with(TestWallet::connected().await);

    let output = run_script(&app, "create\ndisconnect\n").await;

    assert!(output.ends_with("Click button to connect wallet\n[ Connect wallet ]\n"));
    assert_eq!(app.panel().view().await, ViewState::Disconnected);
}

#[tokio::test]
async fn test_session_help_lists_commands() {
    let (_, app) = app_with(Arc::new(TestWallet::new()));

    let output = run_script(&app, "help\n").await;

    assert!(output.contains("commands: connect, disconnect, create, increment"));
}

#[tokio::test]
async fn test_create_failure_leaves_create_offered() {
    let (ledger, app) = app_with(TestWallet::connected().await);
    ledger.fail_next_send("node is behind").await;

    app.execute(SessionCommand::Create).await.unwrap();
    assert_eq!(app.panel().view().await, ViewState::NoAccount);

    app.execute(SessionCommand::Create).await.unwrap();
    assert_eq!(app.panel().view().await, ViewState::HasAccount(0));
}

#[tokio::test]
async fn test_increment_failure_is_returned() {
    let (_, app) = app_with(TestWallet::connected().await);

    let err = app.execute(SessionCommand::Increment).await.unwrap_err();
    assert!(format!("{err:#}").contains("AccountNotInitialized"));
}

#[tokio::test]
async fn test_start_resumes_existing_counter() {
    let ledger = Arc::new(MemoryLedger::new(program()));
    let wallet = Arc::new(TestWallet::new());
    let session = CounterSession::generate();

    let first = app_on(ledger.clone(), wallet.clone(), session.clone());
    first.start().await.unwrap();
    run_script(&first, "create\nincrement\nincrement\n").await;

    // A later run reusing the same account reference.
    let second = app_on(ledger.clone(), wallet, session);
    second.start().await.unwrap();
    assert_eq!(second.panel().view().await, ViewState::HasAccount(2));

    let output = run_script(&second, "create\n").await;
    assert_eq!(
        output,
        "[ Increment counter ]\n[ Decrement counter ]\n2\n".repeat(2)
    );
    assert_eq!(ledger.count(&second.panel().session().address()).await, Some(2));
}

#[tokio::test]
async fn test_start_without_account_offers_create() {
    let (ledger, app) = app_with(Arc::new(TestWallet::new()));

    app.start().await.unwrap();

    assert_eq!(app.panel().view().await, ViewState::NoAccount);
    assert!(ledger.sent().await.is_empty());
}
