//! Partnership requests and their back-office review.

use campushub_core::Error;
use campushub_core::partner::{
    PartnerRequestInput, RequestStatus, ReviewOutcome, list_partner_requests, list_partners,
    new_partner_request_count, review_partner_request, submit_partner_request,
};

mod helpers;

fn request_input() -> PartnerRequestInput {
    PartnerRequestInput {
        org_name: "Acme Robotics".to_owned(),
        contact_name: "Jordan Lee".to_owned(),
        email: "jordan@acme.example".to_owned(),
        message: "We would like to sponsor your hackathon series.".to_owned(),
    }
}

#[tokio::test]
async fn test_submit_stores_a_new_request() -> anyhow::Result<()> {
    let pool = helpers::setup_pool().await?;

    let request = submit_partner_request(&pool, request_input()).await?;
    assert_eq!(request.status.0, RequestStatus::New);

    let queue = list_partner_requests(&pool).await?;
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].org_name, "Acme Robotics");
    assert_eq!(new_partner_request_count(&pool).await?, 1);

    Ok(())
}

#[tokio::test]
async fn test_submit_validates_input() -> anyhow::Result<()> {
    let pool = helpers::setup_pool().await?;

    let mut short_message = request_input();
    short_message.message = "hi".to_owned();
    assert!(matches!(
        submit_partner_request(&pool, short_message).await,
        Err(Error::Validate(_))
    ));

    Ok(())
}

#[tokio::test]
async fn test_approval_creates_a_partner_exactly_once() -> anyhow::Result<()> {
    let pool = helpers::setup_pool().await?;
    let request = submit_partner_request(&pool, request_input()).await?;

    let outcome = review_partner_request(&pool, &request.id, true).await?;
    let ReviewOutcome::Approved { partner_id } = outcome else {
        anyhow::bail!("expected Approved, got {outcome:?}");
    };

    let partners = list_partners(&pool).await?;
    assert_eq!(partners.len(), 1);
    assert_eq!(partners[0].id, partner_id);
    assert_eq!(partners[0].name, "Acme Robotics");

    // Reviewing again changes nothing.
    let again = review_partner_request(&pool, &request.id, true).await?;
    assert_eq!(again, ReviewOutcome::AlreadyReviewed);
    assert_eq!(list_partners(&pool).await?.len(), 1);
    assert_eq!(new_partner_request_count(&pool).await?, 0);

    Ok(())
}

#[tokio::test]
async fn test_decline_leaves_no_partner() -> anyhow::Result<()> {
    let pool = helpers::setup_pool().await?;
    let request = submit_partner_request(&pool, request_input()).await?;

    let outcome = review_partner_request(&pool, &request.id, false).await?;
    assert_eq!(outcome, ReviewOutcome::Declined);
    assert!(list_partners(&pool).await?.is_empty());

    // Declined is final too.
    let again = review_partner_request(&pool, &request.id, true).await?;
    assert_eq!(again, ReviewOutcome::AlreadyReviewed);
    assert!(list_partners(&pool).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_review_unknown_request() -> anyhow::Result<()> {
    let pool = helpers::setup_pool().await?;

    let outcome = review_partner_request(&pool, "no-such-request", true).await?;
    assert_eq!(outcome, ReviewOutcome::NotFound);

    Ok(())
}
