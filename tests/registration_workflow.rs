use anyhow::Result;
use entity::accounts::Role;
use entity::notifications::{Kind, Status};
use entity::{employees, notifications, pending_registrations};
use products_hr::{
    DecisionAction, DecisionOutcome, DocumentUpload, HrError, NotificationFilter,
    NotificationScope, OnboardingPayload, Page,
};
use sea_orm::{EntityTrait, PaginatorTrait};
use suite_tests::{BROKEN_BLOB, Harness, decision, onboarding};
use uuid::Uuid;

#[tokio::test]
async fn submission_parks_the_request_and_notifies_every_admin() -> Result<()> {
    let h = Harness::new().await;
    let first_admin = h.account("boss@example.com", Role::Admin).await;
    let second_admin = h.account("deputy@example.com", Role::Admin).await;
    let user = h.account("ada@example.com", Role::User).await;

    let payload = OnboardingPayload {
        profile_image: Some("data:image/png;base64,aGVsbG8=".into()),
        documents: vec![
            DocumentUpload {
                name: "cv".into(),
                data: "JVBERi0xLjc=".into(),
            },
            DocumentUpload {
                name: "passport".into(),
                data: BROKEN_BLOB.into(),
            },
        ],
        work_email: Some(" Ada@Corp.Example ".into()),
        ..onboarding(" EMP001 ", "Ada@Example.com")
    };
    let submission = h.hr.submit_registration(&user, payload).await?;

    assert!(submission.pending_approval);
    assert_eq!(submission.upload_stats.total, 3);
    assert_eq!(submission.upload_stats.successful, 2);
    assert_eq!(submission.upload_stats.failed, vec!["documents.passport"]);

    let pending = submission.pending_employee;
    assert_eq!(pending.account_id, user.account_id);
    assert_eq!(pending.employee_code, "EMP001");
    assert_eq!(pending.email, "ada@example.com");
    assert_eq!(pending.work_email.as_deref(), Some("ada@corp.example"));
    assert!(pending.profile_image_url.is_some());
    assert!(pending.documents.get("cv").is_some());
    assert!(pending.documents.get("passport").is_none());
    assert_eq!(h.blobs.stored(), 2);

    for admin in [&first_admin, &second_admin] {
        let open = h.open_requests(admin).await;
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].source_id, Some(pending.id));
        assert_eq!(open[0].target_id, admin.account_id);
        assert!(!open[0].read);
    }
    assert_eq!(h.role_of(&user).await, Role::Pending);
    Ok(())
}

/// Pending registrations and notifications currently stored.
async fn stored_rows(h: &Harness) -> Result<(u64, u64)> {
    Ok((
        pending_registrations::Entity::find().count(h.hr.db()).await?,
        notifications::Entity::find().count(h.hr.db()).await?,
    ))
}

#[tokio::test]
async fn guards_fire_in_order() -> Result<()> {
    let h = Harness::new().await;
    let admin = h.account("boss@example.com", Role::Admin).await;
    let veteran = h.account("grace@example.com", Role::User).await;
    h.onboard(
        &admin,
        &veteran,
        OnboardingPayload {
            work_email: Some("grace@corp.example".into()),
            ..onboarding("EMP100", "grace@example.com")
        },
    )
    .await;

    // Already pending.
    let user = h.account("ada@example.com", Role::User).await;
    h.hr
        .submit_registration(&user, onboarding("EMP001", "ada@example.com"))
        .await?;
    let user = h.refreshed(&user).await;
    let err = h
        .hr
        .submit_registration(&user, onboarding("EMP001", "ada@example.com"))
        .await
        .unwrap_err();
    assert!(
        matches!(&err, HrError::Conflict { field: None, message } if message.contains("pending")),
        "{err:?}"
    );
    let baseline = stored_rows(&h).await?;

    // The pending request wins over an invalid payload.
    let err = h
        .hr
        .submit_registration(
            &user,
            OnboardingPayload {
                employee_id: None,
                ..onboarding("EMP001", "ada@example.com")
            },
        )
        .await
        .unwrap_err();
    assert!(
        matches!(&err, HrError::Conflict { field: None, message } if message.contains("pending")),
        "{err:?}"
    );
    assert_eq!(stored_rows(&h).await?, baseline);
    assert_eq!(h.role_of(&user).await, Role::Pending);

    // Already an employee.
    let veteran = h.refreshed(&veteran).await;
    let err = h
        .hr
        .submit_registration(&veteran, onboarding("EMP999", "other@example.com"))
        .await
        .unwrap_err();
    assert!(
        matches!(&err, HrError::Conflict { field: None, message } if message.contains("employee record")),
        "{err:?}"
    );
    assert_eq!(stored_rows(&h).await?, baseline);
    assert_eq!(h.role_of(&veteran).await, Role::Employee);

    // Identifiers already held by an employee, checked code, email, work email.
    let newcomer = h.account("linus@example.com", Role::User).await;
    let cases = [
        (onboarding("EMP100", "grace@example.com"), "employeeId"),
        (onboarding("EMP200", "GRACE@example.com"), "email"),
        (
            OnboardingPayload {
                work_email: Some("grace@corp.example".into()),
                ..onboarding("EMP200", "linus@example.com")
            },
            "workEmail",
        ),
    ];
    for (payload, expected) in cases {
        let err = h
            .hr
            .submit_registration(&newcomer, payload)
            .await
            .unwrap_err();
        assert!(
            matches!(err, HrError::Conflict { field: Some(field), .. } if field == expected),
            "expected conflict on {expected}, got {err:?}"
        );
        assert_eq!(stored_rows(&h).await?, baseline);
    }
    assert_eq!(h.role_of(&newcomer).await, Role::User);
    Ok(())
}

#[tokio::test]
async fn invalid_and_forbidden_submissions() -> Result<()> {
    let h = Harness::new().await;
    let admin = h.account("boss@example.com", Role::Admin).await;
    let user = h.account("ada@example.com", Role::User).await;

    let err = h
        .hr
        .submit_registration(&admin, onboarding("EMP001", "boss@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, HrError::Forbidden(_)), "{err:?}");

    let missing_code = OnboardingPayload {
        employee_id: None,
        ..onboarding("EMP001", "ada@example.com")
    };
    let err = h
        .hr
        .submit_registration(&user, missing_code)
        .await
        .unwrap_err();
    assert!(
        matches!(err, HrError::Invalid { field: Some("employeeId"), .. }),
        "{err:?}"
    );
    assert_eq!(pending_registrations::Entity::find().count(h.hr.db()).await?, 0);
    Ok(())
}

#[tokio::test]
async fn approval_materialises_the_employee() -> Result<()> {
    let h = Harness::new().await;
    let admin = h.account("boss@example.com", Role::Admin).await;
    let deputy = h.account("deputy@example.com", Role::Admin).await;
    let user = h.account("ada@example.com", Role::User).await;
    let submission = h
        .hr
        .submit_registration(
            &user,
            OnboardingPayload {
                department: Some("Research".into()),
                ..onboarding("EMP001", "ada@example.com")
            },
        )
        .await?;

    let request = h.open_requests(&admin).await.remove(0);
    let outcome = h
        .hr
        .decide(
            &admin,
            products_hr::DecisionRequest {
                read: Some(true),
                ..decision(request.id, DecisionAction::Approve)
            },
        )
        .await?;
    let DecisionOutcome::Approved {
        notification,
        employee: Some(employee),
    } = outcome
    else {
        panic!("expected an approval that created the employee");
    };
    assert_eq!(notification.status, Some(Status::Approved));
    assert!(notification.read);

    assert_eq!(employee.id, user.account_id);
    assert_eq!(employee.employee_code, "EMP001");
    assert_eq!(employee.department, "Research");
    assert_eq!(employee.phone, "");
    assert_eq!(employee.work_email, None);
    assert_eq!(employee.joining_date, chrono::Utc::now().date_naive());

    assert_eq!(h.role_of(&user).await, Role::Employee);
    assert!(
        pending_registrations::Entity::find_by_id(submission.pending_employee.id)
            .one(h.hr.db())
            .await?
            .is_none()
    );

    let inbox = h.notifications_for(user.account_id).await;
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].kind, Kind::RequestApproved);
    assert_eq!(inbox[0].status, None);

    // The deputy's copy stays open; approving it later changes nothing else.
    let sibling = h.open_requests(&deputy).await.remove(0);
    let outcome = h
        .hr
        .decide(&deputy, decision(sibling.id, DecisionAction::Approve))
        .await?;
    assert!(matches!(
        outcome,
        DecisionOutcome::Approved { employee: None, ref notification, .. }
            if notification.status == Some(Status::Approved)
    ));
    assert_eq!(employees::Entity::find().count(h.hr.db()).await?, 1);
    assert_eq!(h.notifications_for(user.account_id).await.len(), 1);
    assert_eq!(h.role_of(&user).await, Role::Employee);
    Ok(())
}

#[tokio::test]
async fn approving_the_same_notification_twice_is_a_no_op() -> Result<()> {
    let h = Harness::new().await;
    let admin = h.account("boss@example.com", Role::Admin).await;
    let user = h.account("ada@example.com", Role::User).await;
    h.hr
        .submit_registration(&user, onboarding("EMP001", "ada@example.com"))
        .await?;
    let request = h.open_requests(&admin).await.remove(0);

    let first = h
        .hr
        .decide(&admin, decision(request.id, DecisionAction::Approve))
        .await?;
    assert!(matches!(first, DecisionOutcome::Approved { employee: Some(_), .. }));
    let after_first = stored_rows(&h).await?;

    let second = h
        .hr
        .decide(&admin, decision(request.id, DecisionAction::Approve))
        .await?;
    assert!(matches!(
        second,
        DecisionOutcome::Approved { employee: None, ref notification }
            if notification.id == request.id && notification.status == Some(Status::Approved)
    ));
    assert_eq!(employees::Entity::find().count(h.hr.db()).await?, 1);
    assert_eq!(stored_rows(&h).await?, after_first);
    assert_eq!(h.role_of(&user).await, Role::Employee);
    Ok(())
}

#[tokio::test]
async fn pending_registrations_are_readable_by_admins() -> Result<()> {
    let h = Harness::new().await;
    let admin = h.account("boss@example.com", Role::Admin).await;
    let user = h.account("ada@example.com", Role::User).await;
    let submission = h
        .hr
        .submit_registration(&user, onboarding("EMP001", "ada@example.com"))
        .await?;
    let pending_id = submission.pending_employee.id;

    let listed = h.hr.pending_registrations(&admin, Page::default()).await?;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, pending_id);

    let detail = h.hr.pending_registration(&admin, pending_id).await?;
    assert_eq!(detail, submission.pending_employee);

    let requester = h.refreshed(&user).await;
    let err = h
        .hr
        .pending_registration(&requester, pending_id)
        .await
        .unwrap_err();
    assert!(matches!(err, HrError::Forbidden(_)), "{err:?}");
    let err = h
        .hr
        .pending_registrations(&requester, Page::default())
        .await
        .unwrap_err();
    assert!(matches!(err, HrError::Forbidden(_)), "{err:?}");

    let err = h
        .hr
        .pending_registration(&admin, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, HrError::NotFound("pending registration")), "{err:?}");
    Ok(())
}

#[tokio::test]
async fn rejection_reverts_the_requester() -> Result<()> {
    let h = Harness::new().await;
    let admin = h.account("boss@example.com", Role::Admin).await;
    let user = h.account("ada@example.com", Role::User).await;
    h.hr
        .submit_registration(&user, onboarding("EMP001", "ada@example.com"))
        .await?;

    let request = h.open_requests(&admin).await.remove(0);
    let outcome = h
        .hr
        .decide(
            &admin,
            products_hr::DecisionRequest {
                reason: Some("missing contract".into()),
                ..decision(request.id, DecisionAction::Reject)
            },
        )
        .await?;
    assert!(matches!(outcome, DecisionOutcome::Rejected { .. }));

    assert!(h.open_requests(&admin).await.is_empty());
    assert_eq!(pending_registrations::Entity::find().count(h.hr.db()).await?, 0);
    assert_eq!(employees::Entity::find().count(h.hr.db()).await?, 0);
    assert_eq!(h.role_of(&user).await, Role::User);

    let inbox = h.notifications_for(user.account_id).await;
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].kind, Kind::RequestRejected);
    assert!(inbox[0].message.contains("missing contract"));

    // The requester may try again.
    let user = h.refreshed(&user).await;
    h.hr
        .submit_registration(&user, onboarding("EMP001", "ada@example.com"))
        .await?;
    assert_eq!(h.role_of(&user).await, Role::Pending);
    Ok(())
}

#[tokio::test]
async fn decisions_need_an_admin_and_an_existing_notification() -> Result<()> {
    let h = Harness::new().await;
    let admin = h.account("boss@example.com", Role::Admin).await;
    let user = h.account("ada@example.com", Role::User).await;

    let err = h
        .hr
        .decide(&user, decision(Uuid::new_v4(), DecisionAction::Approve))
        .await
        .unwrap_err();
    assert!(matches!(err, HrError::Forbidden(_)), "{err:?}");

    let err = h
        .hr
        .decide(&admin, decision(Uuid::new_v4(), DecisionAction::Reject))
        .await
        .unwrap_err();
    assert!(matches!(err, HrError::NotFound("notification")), "{err:?}");
    Ok(())
}

#[tokio::test]
async fn concurrent_approvals_create_one_employee() -> Result<()> {
    let h = Harness::new().await;
    let admin = h.account("boss@example.com", Role::Admin).await;
    let deputy = h.account("deputy@example.com", Role::Admin).await;
    let user = h.account("ada@example.com", Role::User).await;
    h.hr
        .submit_registration(&user, onboarding("EMP001", "ada@example.com"))
        .await?;

    let mine = h.open_requests(&admin).await.remove(0);
    let theirs = h.open_requests(&deputy).await.remove(0);
    let (a, b) = tokio::join!(
        h.hr.decide(&admin, decision(mine.id, DecisionAction::Approve)),
        h.hr.decide(&deputy, decision(theirs.id, DecisionAction::Approve)),
    );
    let created = [a?, b?]
        .into_iter()
        .filter(|outcome| {
            matches!(
                outcome,
                DecisionOutcome::Approved {
                    employee: Some(_),
                    ..
                }
            )
        })
        .count();
    assert_eq!(created, 1);
    assert_eq!(employees::Entity::find().count(h.hr.db()).await?, 1);
    assert_eq!(h.role_of(&user).await, Role::Employee);
    Ok(())
}

#[tokio::test]
async fn approve_racing_reject_leaves_a_consistent_account() -> Result<()> {
    let h = Harness::new().await;
    let admin = h.account("boss@example.com", Role::Admin).await;
    let deputy = h.account("deputy@example.com", Role::Admin).await;
    let user = h.account("ada@example.com", Role::User).await;
    h.hr
        .submit_registration(&user, onboarding("EMP001", "ada@example.com"))
        .await?;

    let mine = h.open_requests(&admin).await.remove(0);
    let theirs = h.open_requests(&deputy).await.remove(0);
    let (approve, reject) = tokio::join!(
        h.hr.decide(&admin, decision(mine.id, DecisionAction::Approve)),
        h.hr.decide(&deputy, decision(theirs.id, DecisionAction::Reject)),
    );
    approve?;
    reject?;

    let employees = employees::Entity::find().count(h.hr.db()).await?;
    let pending = pending_registrations::Entity::find().count(h.hr.db()).await?;
    assert_eq!(pending, 0);
    match h.role_of(&user).await {
        Role::Employee => assert_eq!(employees, 1),
        Role::User => assert_eq!(employees, 0),
        other => panic!("unexpected role {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn failed_submissions_remove_their_uploads() -> Result<()> {
    let h = Harness::new().await;
    h.account("boss@example.com", Role::Admin).await;
    // Employee role without an employee row: the guards pass but the role
    // transition inside the transaction does not.
    let odd = h.account("odd@example.com", Role::Employee).await;

    let payload = OnboardingPayload {
        profile_image: Some("aGVsbG8=".into()),
        documents: vec![DocumentUpload {
            name: "cv".into(),
            data: "https://files.example/cv.pdf".into(),
        }],
        ..onboarding("EMP001", "odd@example.com")
    };
    let err = h.hr.submit_registration(&odd, payload).await.unwrap_err();
    assert!(matches!(err, HrError::Transition(_)), "{err:?}");

    assert_eq!(h.blobs.stored(), 0);
    assert_eq!(pending_registrations::Entity::find().count(h.hr.db()).await?, 0);
    assert!(h.notifications_for(odd.account_id).await.is_empty());
    assert_eq!(h.role_of(&odd).await, Role::Employee);
    Ok(())
}

#[tokio::test]
async fn hosted_urls_are_kept_verbatim() -> Result<()> {
    let h = Harness::new().await;
    h.account("boss@example.com", Role::Admin).await;
    let user = h.account("ada@example.com", Role::User).await;
    let submission = h
        .hr
        .submit_registration(
            &user,
            OnboardingPayload {
                profile_image: Some("https://cdn.example/ada.png".into()),
                ..onboarding("EMP001", "ada@example.com")
            },
        )
        .await?;
    assert_eq!(
        submission.pending_employee.profile_image_url.as_deref(),
        Some("https://cdn.example/ada.png")
    );
    assert_eq!(submission.upload_stats.successful, 1);
    assert_eq!(h.blobs.stored(), 0);
    Ok(())
}

#[tokio::test]
async fn notification_visibility_and_read_flags() -> Result<()> {
    let h = Harness::new().await;
    let admin = h.account("boss@example.com", Role::Admin).await;
    let user = h.account("ada@example.com", Role::User).await;
    h.hr
        .submit_registration(&user, onboarding("EMP001", "ada@example.com"))
        .await?;
    let user = h.refreshed(&user).await;

    let everything = NotificationFilter {
        scope: NotificationScope::All,
        ..NotificationFilter::default()
    };
    let err = h
        .hr
        .notifications(&user, everything.clone(), Page::default())
        .await
        .unwrap_err();
    assert!(matches!(err, HrError::Forbidden(_)), "{err:?}");
    assert_eq!(
        h.hr
            .notifications(&admin, everything, Page::default())
            .await?
            .len(),
        1
    );

    let request = h.open_requests(&admin).await.remove(0);
    let err = h
        .hr
        .mark_notification_read(&user, request.id, true)
        .await
        .unwrap_err();
    assert!(matches!(err, HrError::NotFound(_)), "{err:?}");

    let read = h.hr.mark_notification_read(&admin, request.id, true).await?;
    assert!(read.read);
    let unread = NotificationFilter {
        read: Some(false),
        ..NotificationFilter::default()
    };
    assert!(
        h.hr
            .notifications(&admin, unread, Page::default())
            .await?
            .is_empty()
    );
    Ok(())
}

#[tokio::test]
async fn role_changes_only_toggle_admin_rights() -> Result<()> {
    let h = Harness::new().await;
    let admin = h.account("boss@example.com", Role::Admin).await;
    let user = h.account("ada@example.com", Role::User).await;

    let err = h
        .hr
        .change_role(&admin, admin.account_id, Role::User)
        .await
        .unwrap_err();
    assert!(matches!(err, HrError::Conflict { .. }), "{err:?}");

    let err = h
        .hr
        .change_role(&admin, user.account_id, Role::Employee)
        .await
        .unwrap_err();
    assert!(matches!(err, HrError::Invalid { field: Some("role"), .. }), "{err:?}");

    let promoted = h.hr.change_role(&admin, user.account_id, Role::Admin).await?;
    assert_eq!(promoted.role, Role::Admin);

    let demoted = h.hr.change_role(&admin, admin.account_id, Role::User).await?;
    assert_eq!(demoted.role, Role::User);

    let err = h
        .hr
        .change_role(&h.refreshed(&admin).await, user.account_id, Role::User)
        .await
        .unwrap_err();
    assert!(matches!(err, HrError::Forbidden(_)), "{err:?}");
    Ok(())
}
