use crate::infra::{demo_users, find_demo_user, seed_demo_users};
use chrono::NaiveDate;
use clap::Args;
use hdb_housing::error::AppError;
use hdb_housing::workflows::housing::eligibility::{
    DEFAULT_MARRIED_MIN_AGE, DEFAULT_SINGLE_MIN_AGE,
};
use hdb_housing::workflows::housing::{
    EligibilityPolicy, FlatOffer, FlatType, HousingPortal, HousingStores, ProjectDraft,
    ReportFilter,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Day on which the applicant applies (YYYY-MM-DD). Defaults to 10 June 2024.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Minimum age for single applicants (defaults to 35).
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..))]
    pub(crate) single_min_age: Option<u8>,
    /// Skip the enquiry portion of the demo.
    #[arg(long)]
    pub(crate) skip_enquiries: bool,
}

fn acacia_draft() -> ProjectDraft {
    ProjectDraft {
        name: "Acacia".to_string(),
        neighborhood: "Yishun".to_string(),
        open_date: "01/06/2024".to_string(),
        close_date: "30/06/2024".to_string(),
        officer_slots: 3,
        visible: true,
        flats: vec![
            FlatOffer {
                flat_type: "2-room".to_string(),
                units: "10".to_string(),
                price: "300000".to_string(),
            },
            FlatOffer {
                flat_type: "3-room".to_string(),
                units: "5".to_string(),
                price: "450000".to_string(),
            },
        ],
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        today,
        single_min_age,
        skip_enquiries,
    } = args;

    let today = today.unwrap_or_else(|| NaiveDate::from_ymd_opt(2024, 6, 10).unwrap_or_default());
    let policy = EligibilityPolicy::new(
        single_min_age.unwrap_or(DEFAULT_SINGLE_MIN_AGE),
        DEFAULT_MARRIED_MIN_AGE,
    );
    let portal = HousingPortal::new(HousingStores::in_memory(), policy);
    seed_demo_users(&portal)?;

    let users = demo_users()?;
    let manager = find_demo_user(&users, "Michael")?;
    let officer = find_demo_user(&users, "Daniel")?;
    let applicant = find_demo_user(&users, "James")?;
    let young_single = find_demo_user(&users, "Rachel")?;

    println!("HDB housing portal demo");

    let project = portal.projects().create_project(&manager, acacia_draft())?;
    println!(
        "- {} created project {} in {} ({} to {})",
        manager.name, project.name, project.neighborhood, project.open_date, project.close_date
    );
    for flat_type in FlatType::ordered() {
        if let Some(inventory) = project.flats.get(&flat_type) {
            println!(
                "  - {}: {} units at ${}",
                flat_type, inventory.total_units, inventory.price
            );
        }
    }

    portal
        .registrations()
        .register_for_project(&officer, &project.name, today)?;
    let registration = portal.registrations().approve_registration(
        &manager,
        &officer.nric,
        &project.name,
    )?;
    println!(
        "- Officer {} registration {}",
        officer.name,
        registration.status.label()
    );

    let visible = portal.projects().visible_projects(&applicant, today)?;
    println!(
        "- {} sees {} open project(s) on {}",
        applicant.name,
        visible.len(),
        today
    );

    let application =
        portal
            .applications()
            .apply_for_project(&applicant, &project.name, "2-room", today)?;
    println!(
        "- {} applied for a {} flat -> {}",
        applicant.name, application.flat_type, application.status
    );

    match portal
        .applications()
        .apply_for_project(&young_single, &project.name, "3-room", today)
    {
        Ok(_) => println!("  Unexpected: {} was allowed a 3-Room flat", young_single.name),
        Err(err) => println!(
            "- {} ({}, {}) refused: {} [{}]",
            young_single.name,
            young_single.age,
            young_single.marital_status,
            err,
            err.kind().label()
        ),
    }

    let approved = portal
        .applications()
        .approve_application(&manager, &applicant.nric)?;
    let remaining = portal
        .projects()
        .project(&project.name)?
        .flats
        .get(&approved.flat_type)
        .map(|inventory| inventory.remaining_units)
        .unwrap_or_default();
    println!(
        "- {} approved the application -> {} ({} units left)",
        manager.name, approved.status, remaining
    );

    let booked = portal
        .applications()
        .complete_booking(&officer, &applicant.nric, today)?;
    println!("- {} completed booking -> {}", officer.name, booked.status);

    let receipt = portal
        .applications()
        .generate_booking_receipt(&applicant.nric)?;
    println!("\nBooking receipt");
    println!(
        "  {} ({}), age {}, {}",
        receipt.applicant_name, receipt.applicant, receipt.age, receipt.marital_status_label
    );
    println!(
        "  {} / {} / {} at ${}",
        receipt.project, receipt.neighborhood, receipt.flat_type_label, receipt.price
    );
    println!("  Booked on {} by {}", receipt.booked_on, receipt.booked_by);

    let report = portal
        .projects()
        .generate_report(&manager, &project.name, &ReportFilter::default())?;
    println!("\nApplicant report for {} ({} rows)", project.name, report.len());
    for entry in &report {
        println!(
            "  - {} | {} | {} | {} | {}",
            entry.applicant_name,
            entry.age,
            entry.marital_status_label,
            entry.flat_type_label,
            entry.status
        );
    }

    if skip_enquiries {
        return Ok(());
    }

    println!("\nEnquiries");
    let enquiry = portal.enquiries().submit(
        &applicant,
        &project.name,
        "When can I collect my keys?",
        today,
    )?;
    println!("- {} asked ({}): {}", applicant.name, enquiry.id, enquiry.message);
    let answered = portal.enquiries().add_reply(
        &enquiry.id,
        &officer,
        "Key collection starts in Q3 2027.",
    )?;
    for reply in &answered.replies {
        println!("  {} {}: {}", reply.role.label(), reply.responder, reply.content);
    }
    println!("  Status: {}", answered.status.label());

    Ok(())
}
