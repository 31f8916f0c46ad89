//! Admin board coverage: debounce, selection, bulk, status and field edits.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use mockall::predicate::eq;
use pagination::Paginated;
use rstest::rstest;
use serde_json::json;

use super::*;
use crate::domain::admin::{BulkStatusResult, PARTIAL_FAILURE_WARNING, ReasonCode, TokioSleeper};
use crate::domain::ports::{FixedConfirm, GatewayError, MockAdminApi, MockConfirm};
use crate::domain::{ApplicationPayload, ApplicationStatus, ErrorCode};
use crate::test_support::application;

const WINDOW: Duration = Duration::from_millis(300);

fn board(api: MockAdminApi, role: Role) -> AdminBoard {
    AdminBoard::new(Arc::new(api), role, Arc::new(TokioSleeper), WINDOW)
}

fn rows(ids: &[ApplicationId], status: ApplicationStatus) -> Paginated<Application> {
    Paginated::single_page(ids.iter().map(|id| application(*id, status)).collect())
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn rapid_filter_changes_issue_one_request() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let mut api = MockAdminApi::new();
    api.expect_list()
        .withf(|query| query.search() == Some("amina") && query.page().page() == 0)
        .returning(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(rows(&[ApplicationId::random()], ApplicationStatus::Submitted))
        });
    let board = board(api, Role::AdminTier1);

    let (first, second, third) = tokio::join!(
        board.change_query(|q| q.set_search(Some("a"))),
        board.change_query(|q| q.set_search(Some("ami"))),
        board.change_query(|q| q.set_search(Some("amina"))),
    );

    assert_eq!(first.expect("first"), RefreshOutcome::Superseded);
    assert_eq!(second.expect("second"), RefreshOutcome::Superseded);
    assert_eq!(third.expect("third"), RefreshOutcome::Fetched { count: 1 });
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(board.snapshot().rows.len(), 1);
}

#[rstest]
#[tokio::test]
async fn bulk_approve_sends_one_request_and_refreshes() {
    let ids = vec![
        ApplicationId::random(),
        ApplicationId::random(),
        ApplicationId::random(),
    ];
    let listed = ids.clone();
    let approved = ids.clone();
    let expected = ids.clone();
    let mut seq = mockall::Sequence::new();
    let mut api = MockAdminApi::new();
    api.expect_list()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(move |_| Ok(rows(&listed, ApplicationStatus::UnderReview)));
    api.expect_bulk_update_status()
        .withf(move |request| {
            request.application_ids.len() == 3
                && expected.iter().all(|id| request.application_ids.contains(id))
                && request.status == ApplicationStatus::Approved
        })
        .times(1)
        .in_sequence(&mut seq)
        .return_once(|_| {
            Ok(BulkStatusResult {
                updated_count: 3,
                failed_count: 0,
            })
        });
    api.expect_list()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(move |_| Ok(rows(&approved, ApplicationStatus::Approved)));
    let board = board(api, Role::AdminTier1);

    board.refresh().await.expect("initial list");
    board.select_all_visible();
    assert_eq!(board.snapshot().selected.len(), 3);

    let outcome = board
        .bulk(BulkAction::Approve, &FixedConfirm(true))
        .await
        .expect("bulk");

    assert_eq!(outcome, BulkOutcome::Completed { count: 3 });
    let state = board.snapshot();
    assert!(state.selected.is_empty());
    assert_eq!(state.rows.len(), 3);
    assert!(
        state
            .rows
            .iter()
            .all(|row| row.status == ApplicationStatus::Approved)
    );
}

#[rstest]
#[tokio::test]
async fn declined_confirmation_sends_nothing() {
    let id = ApplicationId::random();
    let mut api = MockAdminApi::new();
    api.expect_list()
        .return_once(move |_| Ok(rows(&[id], ApplicationStatus::UnderReview)));
    api.expect_bulk_update_status().times(0);
    let mut confirm = MockConfirm::new();
    confirm
        .expect_confirm()
        .withf(|prompt| prompt.starts_with("Reject 1 selected application?"))
        .times(1)
        .return_const(false);
    let board = board(api, Role::AdminTier1);

    board.refresh().await.expect("list");
    board.toggle_selected(id);
    let outcome = board
        .bulk(BulkAction::Reject, &confirm)
        .await
        .expect("cancelled");
    assert_eq!(outcome, BulkOutcome::Cancelled);
    assert_eq!(board.snapshot().selected.len(), 1);
}

#[rstest]
#[tokio::test]
async fn partial_bulk_failure_leaves_generic_warning() {
    let ids = [ApplicationId::random(), ApplicationId::random()];
    let mut api = MockAdminApi::new();
    api.expect_list()
        .returning(move |_| Ok(rows(&ids, ApplicationStatus::UnderReview)));
    api.expect_bulk_update_status().return_once(|_| {
        Ok(BulkStatusResult {
            updated_count: 1,
            failed_count: 1,
        })
    });
    let board = board(api, Role::AdminTier1);

    board.refresh().await.expect("list");
    board.select_all_visible();
    let outcome = board
        .bulk(BulkAction::Reject, &FixedConfirm(true))
        .await
        .expect("bulk");
    assert!(matches!(outcome, BulkOutcome::PartiallyFailed { .. }));
    assert_eq!(
        board.snapshot().warning.as_deref(),
        Some(PARTIAL_FAILURE_WARNING)
    );
}

#[rstest]
#[case(ApplicationStatus::Rejected, BulkAction::Approve)]
#[case(ApplicationStatus::Submitted, BulkAction::Approve)]
#[case(ApplicationStatus::Approved, BulkAction::Reject)]
#[tokio::test]
async fn tier_one_bulk_cannot_move_backwards(
    #[case] current: ApplicationStatus,
    #[case] action: BulkAction,
) {
    let id = ApplicationId::random();
    let mut api = MockAdminApi::new();
    api.expect_list()
        .times(1)
        .return_once(move |_| Ok(rows(&[id], current)));
    api.expect_bulk_update_status().times(0);
    let mut confirm = MockConfirm::new();
    confirm.expect_confirm().times(0);
    let board = board(api, Role::AdminTier1);

    board.refresh().await.expect("list");
    board.toggle_selected(id);
    let err = board
        .bulk(action, &confirm)
        .await
        .expect_err("override needs tier two");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(err.details(), Some(&json!({ "applicationIds": [id] })));
    assert_eq!(board.snapshot().selected.len(), 1);
}

#[rstest]
#[tokio::test]
async fn tier_two_bulk_may_override() {
    let id = ApplicationId::random();
    let mut api = MockAdminApi::new();
    api.expect_list()
        .returning(move |_| Ok(rows(&[id], ApplicationStatus::Rejected)));
    api.expect_bulk_update_status()
        .withf(move |request| request.application_ids == vec![id])
        .times(1)
        .return_once(|_| {
            Ok(BulkStatusResult {
                updated_count: 1,
                failed_count: 0,
            })
        });
    let board = board(api, Role::AdminTier2);

    board.refresh().await.expect("list");
    board.toggle_selected(id);
    let outcome = board
        .bulk(BulkAction::Approve, &FixedConfirm(true))
        .await
        .expect("override allowed");
    assert_eq!(outcome, BulkOutcome::Completed { count: 1 });
}

#[rstest]
#[tokio::test]
async fn unlisted_selection_is_looked_up_before_bulk() {
    let id = ApplicationId::random();
    let mut api = MockAdminApi::new();
    api.expect_get()
        .with(eq(id))
        .times(1)
        .return_once(move |_| Ok(application(id, ApplicationStatus::UnderReview)));
    api.expect_bulk_update_status()
        .times(1)
        .return_once(|_| {
            Ok(BulkStatusResult {
                updated_count: 1,
                failed_count: 0,
            })
        });
    api.expect_list()
        .returning(move |_| Ok(rows(&[id], ApplicationStatus::Approved)));
    let board = board(api, Role::AdminTier1);

    board.toggle_selected(id);
    let outcome = board
        .bulk(BulkAction::Approve, &FixedConfirm(true))
        .await
        .expect("forward move");
    assert_eq!(outcome, BulkOutcome::Completed { count: 1 });
}

#[rstest]
#[tokio::test]
async fn empty_selection_is_a_no_op() {
    let mut api = MockAdminApi::new();
    api.expect_bulk_update_status().times(0);
    let board = board(api, Role::AdminTier1);
    let outcome = board
        .bulk(BulkAction::Approve, &FixedConfirm(true))
        .await
        .expect("no-op");
    assert_eq!(outcome, BulkOutcome::NothingSelected);
}

#[rstest]
#[tokio::test]
async fn status_change_prefixes_reason_and_updates_row() {
    let id = ApplicationId::random();
    let mut api = MockAdminApi::new();
    api.expect_get()
        .with(eq(id))
        .return_once(move |_| Ok(application(id, ApplicationStatus::UnderReview)));
    api.expect_update_status()
        .withf(move |app_id, change| {
            *app_id == id
                && change.status == ApplicationStatus::Rejected
                && change.comment == "[INSUFFICIENT_INCOME] Salary below threshold"
        })
        .times(1)
        .return_once(move |_, _| Ok(application(id, ApplicationStatus::Rejected)));
    let board = board(api, Role::AdminTier1);

    board.open(id).await.expect("open");
    let mut form = board.status_form().expect("open application");
    form.set_target(ApplicationStatus::Rejected);
    form.set_reason(Some(ReasonCode::InsufficientIncome));
    form.set_comment("Salary below threshold");

    let updated = board.change_status(id, &form).await.expect("changed");
    assert_eq!(updated.status, ApplicationStatus::Rejected);
    assert_eq!(
        board.snapshot().current.map(|app| app.status),
        Some(ApplicationStatus::Rejected)
    );
}

#[rstest]
#[tokio::test]
async fn tier_one_cannot_override_terminal_status() {
    let id = ApplicationId::random();
    let mut api = MockAdminApi::new();
    api.expect_get()
        .return_once(move |_| Ok(application(id, ApplicationStatus::Approved)));
    api.expect_update_status().times(0);
    let board = board(api, Role::AdminTier1);

    board.open(id).await.expect("open");
    let mut form = board.status_form().expect("form");
    form.set_target(ApplicationStatus::Rejected);
    form.set_comment("Reopened after audit");
    let err = board
        .change_status(id, &form)
        .await
        .expect_err("override needs tier two");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn rejected_field_edit_reverts_local_value() {
    let id = ApplicationId::random();
    let mut api = MockAdminApi::new();
    api.expect_get()
        .times(1)
        .return_once(move |_| Ok(application(id, ApplicationStatus::UnderReview)));
    api.expect_patch_data()
        .withf(|_, patch| patch == &json!({ "businessName": "Mama Lishe Ltd" }))
        .times(1)
        .return_once(|_, _| Err(GatewayError::rejected(400_u16, "Field is locked")));
    let board = board(api, Role::AdminTier2);

    board.open(id).await.expect("open");
    let err = board
        .edit_field("businessName", json!("Mama Lishe Ltd"))
        .await
        .expect_err("rejected");
    assert_eq!(err.message(), "Field is locked");

    let state = board.snapshot();
    let Some(ApplicationPayload::Sme(data)) = state.current.map(|app| app.payload) else {
        panic!("SME application expected");
    };
    assert_eq!(data.business_name, "Mama Lishe Foods");
    assert_eq!(state.status.last_error(), Some("Field is locked"));
}

#[rstest]
#[tokio::test]
async fn accepted_field_edit_reconciles_with_server_copy() {
    let id = ApplicationId::random();
    let mut seq = mockall::Sequence::new();
    let mut api = MockAdminApi::new();
    api.expect_get()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(move |_| Ok(application(id, ApplicationStatus::UnderReview)));
    api.expect_patch_data()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(|_, _| Ok(()));
    api.expect_get()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(move |_| {
            let mut app = application(id, ApplicationStatus::UnderReview);
            if let ApplicationPayload::Sme(data) = &mut app.payload {
                data.monthly_revenue = Some(1_200_000);
            }
            Ok(app)
        });
    let board = board(api, Role::AdminTier2);

    board.open(id).await.expect("open");
    let updated = board
        .edit_field("monthlyRevenue", json!(1_200_000))
        .await
        .expect("accepted");
    assert!(matches!(
        updated.payload,
        ApplicationPayload::Sme(ref data) if data.monthly_revenue == Some(1_200_000)
    ));
}

#[rstest]
#[tokio::test]
async fn unknown_field_is_rejected_before_any_request() {
    let id = ApplicationId::random();
    let mut api = MockAdminApi::new();
    api.expect_get()
        .return_once(move |_| Ok(application(id, ApplicationStatus::UnderReview)));
    api.expect_patch_data().times(0);
    let board = board(api, Role::AdminTier2);

    board.open(id).await.expect("open");
    let err = board
        .edit_field("favouriteColour", json!("blue"))
        .await
        .expect_err("unknown");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn export_uses_current_filters() {
    let mut api = MockAdminApi::new();
    api.expect_export_csv()
        .withf(|query| query.status() == Some(ApplicationStatus::Approved))
        .return_once(|_| Ok(b"id,status\n".to_vec()));
    let board = board(api, Role::AdminTier1);
    with_state(&board.state, |s| {
        s.query.set_status(Some(ApplicationStatus::Approved));
    });
    let csv = board.export_csv().await.expect("csv");
    assert!(csv.starts_with(b"id,status"));
}
