// tests/providers_learningguild.rs
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use ld_job_harvester::classify::{Category, EmploymentType, ExperienceLevel, LocationType};
use ld_job_harvester::clock::FixedClock;
use ld_job_harvester::config::keywords::Keywords;
use ld_job_harvester::fetch::{Credentials, FetchSettings};
use ld_job_harvester::salary::SalaryPeriod;
use ld_job_harvester::sources::{AdapterContext, ItemOutcome, SourceAdapter, SourceKind};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LISTING: &str = include_str!("fixtures/learningguild_listing.html");
const JOB_JSONLD: &str = include_str!("fixtures/learningguild_job_jsonld.html");
const JOB_MARKUP: &str = include_str!("fixtures/learningguild_job_markup.html");

fn context() -> AdapterContext {
    AdapterContext::new(
        Credentials::default(),
        FetchSettings::default(),
        Arc::new(Keywords::default()),
        Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap())),
        30,
    )
    .unwrap()
}

async fn guild_server() -> MockServer {
    let server = MockServer::start().await;
    for (p, status, body) in [
        ("/jobs/", 200, LISTING),
        ("/jobs/4411/senior-learning-designer", 200, JOB_JSONLD),
        ("/jobs/4412/training-facilitator", 200, JOB_MARKUP),
        ("/jobs/4413/missing-posting", 404, ""),
    ] {
        Mock::given(method("GET"))
            .and(path(p))
            .respond_with(ResponseTemplate::new(status).set_body_raw(body, "text/html"))
            .mount(&server)
            .await;
    }
    server
}

#[tokio::test]
async fn listing_detail_pages_prefer_structured_metadata() {
    let server = guild_server().await;
    let mut adapter = SourceKind::LearningGuild
        .build(context(), None, Some(&format!("{}/jobs/", server.uri())))
        .unwrap();

    let report = adapter.scrape(10).await.unwrap();
    assert_eq!(report.enumerated, 3, "duplicates, externals and the index are dropped");
    let kinds: Vec<&str> = report.outcomes.iter().map(|o| o.kind()).collect();
    assert_eq!(kinds, vec!["parsed", "parsed", "fetch_failed"]);

    let ItemOutcome::Parsed(sld) = &report.outcomes[0] else {
        panic!("first posting should parse");
    };
    // JSON-LD title wins over the page heading
    assert_eq!(sld.title, "Senior Learning Designer");
    assert_eq!(sld.company, "Contoso Learning");
    assert_eq!(sld.location, "Austin, TX, US");
    assert_eq!(sld.location_type, LocationType::Hybrid);
    assert_eq!(sld.employment_type, EmploymentType::FullTime);
    assert_eq!(sld.experience_level, ExperienceLevel::Senior);
    assert_eq!(sld.category, Category::InstructionalDesign);
    assert_eq!(sld.posted_at, Utc.with_ymd_and_hms(2024, 3, 28, 0, 0, 0).unwrap());
    assert_eq!(
        sld.requirements,
        vec!["6+ years in instructional design", "Portfolio required"]
    );
    let salary = sld.salary.as_ref().unwrap();
    assert_eq!((salary.min, salary.max, salary.period), (Some(95000), Some(120000), SalaryPeriod::Annual));

    let ItemOutcome::Parsed(tf) = &report.outcomes[1] else {
        panic!("second posting should parse");
    };
    assert_eq!(tf.title, "Training Facilitator");
    assert_eq!(tf.company, "Fabrikam University");
    assert_eq!(tf.location, "Remote");
    assert_eq!(tf.location_type, LocationType::Remote);
    assert_eq!(tf.experience_level, ExperienceLevel::Entry);
    assert_eq!(tf.category, Category::TrainingFacilitation);
    assert_eq!(
        tf.description,
        "Deliver virtual instructor-led training to new hires.\nEntry level role, great for new trainers."
    );
}

#[tokio::test]
async fn page_without_title_is_absent() {
    let adapter = SourceKind::LearningGuild.build(context(), None, None).unwrap();
    let out = adapter
        .parse("https://www.learningguild.com/jobs/1/x", Some("<html><body><p>gone</p></body></html>"))
        .unwrap();
    assert!(out.is_none());
    assert!(adapter.parse("https://www.learningguild.com/jobs/1/x", None).unwrap().is_none());
}

#[tokio::test]
async fn markup_location_defaults_to_united_states() {
    let adapter = SourceKind::LearningGuild.build(context(), None, None).unwrap();
    let rec = adapter
        .parse(
            "https://www.learningguild.com/jobs/9/id",
            Some("<h1>Instructional Designer</h1><div class='description'>Onsite in our HQ.</div>"),
        )
        .unwrap()
        .unwrap();
    assert_eq!(rec.location, "United States");
    assert_eq!(rec.location_type, LocationType::Onsite);
    assert_eq!(rec.company, "Unknown Company");
}
