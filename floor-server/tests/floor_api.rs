//! End-to-end: floor-engine session driving a live floor-server over HTTP

use floor_client::{ClientConfig, HttpClient};
use floor_engine::{BillTransfer, DropOutcome, FloorSession, LayoutConfig, Point};
use floor_server::{Config, Server, ServerState};
use rust_decimal::Decimal;
use shared::error::ErrorCode;
use shared::models::{
    DiningTableCreate, DisjoinRequest, JoinCommand, OrderLineInput, SubmitOrder, TableId,
};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

struct TestServer {
    client: HttpClient,
    shutdown: Option<oneshot::Sender<()>>,
    _work_dir: tempfile::TempDir,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

async fn start_server() -> TestServer {
    let work_dir = tempfile::tempdir().unwrap();
    let config = Config::with_overrides(work_dir.path().to_string_lossy(), 0);
    let state = ServerState::initialize(&config).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();

    let server = Server::with_state(config, state);
    tokio::spawn(async move {
        let _ = server
            .serve(listener, async move {
                let _ = rx.await;
            })
            .await;
    });

    let client = HttpClient::new(&ClientConfig::new(format!("http://{addr}"))).unwrap();
    TestServer {
        client,
        shutdown: Some(tx),
        _work_dir: work_dir,
    }
}

async fn create_table(client: &HttpClient, number: &str, x: f64, y: f64) -> TableId {
    client
        .create_table(&DiningTableCreate {
            number: number.to_string(),
            capacity: None,
            position_x: Some(x),
            position_y: Some(y),
        })
        .await
        .unwrap()
        .id
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[tokio::test]
async fn test_join_transfer_and_split_over_http() {
    let server = start_server().await;
    let client = server.client.clone();

    let t1 = create_table(&client, "1", 10.0, 10.0).await;
    let t2 = create_table(&client, "2", 40.0, 10.0).await;
    let t3 = create_table(&client, "3", 70.0, 40.0).await;

    let mut session = FloorSession::new(client.clone(), LayoutConfig::default());
    assert!(session.set_canvas(1000.0, 800.0));
    session.load().await.unwrap();
    assert_eq!(session.floor().len(), 3);

    // Join: lowest id becomes parent, child placed one card-width right
    let receipt = session.join(&[t2, t1]).await.unwrap();
    assert_eq!(receipt.parent_id, t1);
    let child = client.get_table(t2).await.unwrap();
    assert_eq!(child.parent_id, Some(t1));
    assert!(approx(child.position_x, 10.0 + 9.6));
    assert!(approx(child.position_y, 10.0));

    // Orders submitted at a child land on the group root
    let order = client
        .submit_order(&SubmitOrder {
            table_id: t2,
            items: vec![OrderLineInput {
                menu_item_id: 11,
                name: "Dal Makhani".to_string(),
                unit_price: Decimal::new(1800, 2),
                option_ids: vec![],
                quantity: 2,
            }],
        })
        .await
        .unwrap();
    assert_eq!(order.table_id, t1);
    let item_id = order.lines[0].id;

    // Transfer the only line to table 3: source group freed, table 3 occupied
    let transfer = BillTransfer::from_table(t2)
        .to_table(t3)
        .with_items([item_id]);
    session.transfer(&transfer).await.unwrap();
    assert!(client.get_order(t1).await.unwrap().is_none());
    assert!(session.floor().get(t3).unwrap().is_occupied);
    assert!(!session.floor().get(t2).unwrap().is_occupied);

    // Split with position restore
    let receipt = session
        .disjoin(t1, &DisjoinRequest::whole().with_restore_positions(true))
        .await
        .unwrap();
    assert!(receipt.disbanded);
    let released = client.get_table(t2).await.unwrap();
    assert!(released.parent_id.is_none());
    assert_eq!(released.position(), (40.0, 10.0));
}

#[tokio::test]
async fn test_join_retry_with_same_operation_id_is_idempotent() {
    let server = start_server().await;
    let client = server.client.clone();
    let t1 = create_table(&client, "1", 10.0, 10.0).await;
    let t2 = create_table(&client, "2", 40.0, 10.0).await;

    let command = JoinCommand {
        operation_id: "retry-me".to_string(),
        table_ids: vec![t1, t2],
        positions: vec![],
    };
    let first = client.join_tables(&command).await.unwrap();
    let second = client.join_tables(&command).await.unwrap();
    assert!(!first.replayed);
    assert!(second.replayed);
    assert_eq!(first.parent_id, second.parent_id);

    let err = client
        .join_tables(&JoinCommand {
            operation_id: "too-few".to_string(),
            table_ids: vec![t1],
            positions: vec![],
        })
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::JoinTooFewTables));
}

#[tokio::test]
async fn test_drop_near_table_prompts_join() {
    let server = start_server().await;
    let client = server.client.clone();
    let t1 = create_table(&client, "1", 10.0, 10.0).await;
    let t2 = create_table(&client, "2", 60.0, 60.0).await;

    let mut session = FloorSession::new(client.clone(), LayoutConfig::default());
    session.set_canvas(1000.0, 800.0);
    session.load().await.unwrap();

    // Decline: table moves to the drop point, no grouping
    session.begin_drag(t2).unwrap();
    session.drag_to(Point::new(12.0, 11.0)).unwrap();
    let outcome = session.release_drag().await.unwrap();
    assert!(matches!(outcome, DropOutcome::ConfirmJoin(p) if p.target == t1));
    session.reject_join().await.unwrap();
    let moved = client.get_table(t2).await.unwrap();
    assert_eq!(moved.position(), (12.0, 11.0));
    assert!(moved.parent_id.is_none());

    // Confirm: joined under the lower id
    session.begin_drag(t2).unwrap();
    session.drag_to(Point::new(11.0, 10.0)).unwrap();
    session.release_drag().await.unwrap();
    let receipt = session.confirm_join().await.unwrap();
    assert_eq!(receipt.parent_id, t1);
    assert_eq!(client.get_table(t2).await.unwrap().parent_id, Some(t1));
}

#[tokio::test]
async fn test_rejections_surface_error_codes() {
    let server = start_server().await;
    let client = server.client.clone();
    let t1 = create_table(&client, "1", 10.0, 10.0).await;

    let err = client
        .create_table(&DiningTableCreate {
            number: "1".to_string(),
            capacity: None,
            position_x: None,
            position_y: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::TableNumberExists));

    let err = client
        .disjoin(t1, &DisjoinRequest::whole())
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::TableNotJoined));

    let err = client.settle(t1).await.unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::OrderNotFound));
}
