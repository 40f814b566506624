//! # Rebound CLI Application
//!
//! Interactive terminal front-end for the rebound hammer strength engine.
//! The CLI is a thin collaborator: it collects orientation and raw readings,
//! hands them to `rebound_core`, and prints what comes back.

use std::fs;
use std::io::{self, BufRead, Write};

use rebound_core::calculations::strength::{calculate, StrengthInput};
use rebound_core::curves::Orientation;
use rebound_core::record::TestRecord;
use rebound_core::repository::{SaveOutcome, TestRepository};
use rebound_core::session::Session;
use rebound_core::share::{self, ProjectShare, SharePayload, TestShare};
use rebound_core::store::FileStore;
use rebound_core::transfer;

/// Default backing file for the test record store
const STORE_FILE: &str = "rebound_tests.json";

fn prompt(label: &str) -> String {
    print!("{label}");
    if io::stdout().flush().is_err() {
        return String::new();
    }

    let mut input = String::new();
    if io::stdin().lock().read_line(&mut input).is_err() {
        return String::new();
    }
    input.trim().to_string()
}

/// Parse a pasted line of readings: comma, tab, semicolon, or whitespace
/// separated; tokens that are not numbers are skipped.
fn parse_r_values(input: &str) -> Vec<f64> {
    input
        .split(|c: char| matches!(c, ',' | '\t' | '\n' | '\r' | ';') || c == ' ')
        .filter_map(|token| token.trim().parse::<f64>().ok())
        .collect()
}

fn pick_orientation(session: &mut Session) {
    println!("Test orientation:");
    for (i, orientation) in Orientation::ALL.iter().enumerate() {
        let marker = if *orientation == session.orientation { "*" } else { " " };
        println!("  {} {}. {}", marker, i + 1, orientation);
    }

    let choice = prompt("Select [keep current]: ");
    if let Ok(index) = choice.parse::<usize>() {
        if let Some(orientation) = Orientation::ALL.get(index.wrapping_sub(1)) {
            session.orientation = *orientation;
        }
    }
    println!("Using {} curve.", session.orientation);
}

fn run_calculation(session: &Session, repo: &mut TestRepository<FileStore>) {
    let line = prompt("R-values (comma, tab or space separated): ");
    let r_values = parse_r_values(&line);
    if r_values.is_empty() {
        println!("No numeric readings entered.");
        return;
    }
    println!("Parsed {} readings.", r_values.len());

    let input = StrengthInput {
        label: "cli".to_string(),
        orientation: session.orientation,
        r_values: r_values.clone(),
    };

    let result = match calculate(&input) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error: {e}");
            if let Ok(json) = serde_json::to_string_pretty(&e) {
                eprintln!("{json}");
            }
            return;
        }
    };

    println!();
    println!("═══════════════════════════════════════");
    println!("  STRENGTH CALCULATION RESULTS");
    println!("═══════════════════════════════════════");
    println!("{}", result.format_report());

    println!("JSON Output (for API use):");
    if let Ok(json) = serde_json::to_string_pretty(&result) {
        println!("{json}");
    }

    if prompt("Save this test? [y/N]: ").eq_ignore_ascii_case("y") {
        save_flow(session, repo, r_values);
    }
}

fn save_flow(session: &Session, repo: &mut TestRepository<FileStore>, r_values: Vec<f64>) {
    let project = prompt("Project: ");
    let location = prompt("Location: ");
    let record = TestRecord::new(project, location, session.orientation, r_values);

    match repo.save(record) {
        Ok(SaveOutcome::Saved(saved)) => println!("Saved '{}'.", saved.display_name),
        Ok(SaveOutcome::Conflict { existing, attempted }) => {
            println!(
                "A test for '{}' / '{}' already exists.",
                existing.project, existing.location
            );
            match prompt("(o)verwrite, (r)ename location, or (a)bort: ").as_str() {
                "o" | "O" => match repo.overwrite(&existing.id, attempted) {
                    Ok(saved) => println!("Overwrote '{}'.", saved.display_name),
                    Err(e) => eprintln!("Error: {e}"),
                },
                "r" | "R" => {
                    let new_location = prompt("New location: ");
                    match repo.save_as(attempted, &new_location) {
                        Ok(saved) => println!("Saved '{}'.", saved.display_name),
                        Err(e) => eprintln!("Error: {e}"),
                    }
                }
                _ => println!("Save abandoned."),
            }
        }
        Err(e) => eprintln!("Error: {e}"),
    }
}

fn list_tests(repo: &TestRepository<FileStore>) {
    let projects = repo.projects();
    if projects.is_empty() {
        println!("No saved tests.");
        return;
    }
    for project in projects {
        println!("{project}");
        for record in repo.by_project(&project) {
            println!(
                "  {} [{}] {} readings, {}",
                record.display_name,
                record.test_type,
                record.r_values.len(),
                record.timestamp.format("%Y-%m-%d %H:%M")
            );
        }
    }
}

fn delete_flow(repo: &mut TestRepository<FileStore>) {
    let project = prompt("Project (blank for any): ");
    let location = prompt("Location (blank for any): ");

    let project = (!project.is_empty()).then_some(project);
    let location = (!location.is_empty()).then_some(location);

    match repo.delete(project.as_deref(), location.as_deref()) {
        Ok(removed) => println!("Deleted '{}'.", removed.display_name),
        Err(e) => eprintln!("Error: {e}"),
    }
}

fn share_flow(repo: &TestRepository<FileStore>) {
    let project = prompt("Project to share: ");
    let location = prompt("Location (blank to share the whole project): ");

    let payload = if location.is_empty() {
        let records = repo.by_project(&project);
        if records.is_empty() {
            println!("No tests for '{project}'.");
            return;
        }
        SharePayload::Project(ProjectShare::from_records(project, &records))
    } else {
        match repo.find_exact(&project, &location) {
            Some(record) => SharePayload::Test(TestShare::from_record(&record)),
            None => {
                println!("No single test matches '{project}' / '{location}'.");
                return;
            }
        }
    };

    match share::encode(&payload) {
        Ok(token) => {
            println!("Token: {token}");
            println!("Link:  {}", share::share_url(&token));
        }
        Err(e) => eprintln!("Error: {e}"),
    }
}

fn receive_share_flow(session: &mut Session, repo: &mut TestRepository<FileStore>) {
    let input = prompt("Share link or token: ");
    let token = share::token_from_url(&input).unwrap_or(input.as_str());

    let payload = match share::decode(token) {
        Ok(payload) => payload,
        Err(e) => {
            eprintln!("Error: {e}");
            return;
        }
    };

    let records = payload.into_records();
    if let Some(first) = records.first() {
        session.shared_project = Some(first.project.clone());
    }
    println!("Share contains {} test(s).", records.len());
    for record in records {
        match repo.save(record) {
            Ok(SaveOutcome::Saved(saved)) => println!("  saved '{}'", saved.display_name),
            Ok(SaveOutcome::Conflict { existing, .. }) => {
                println!("  skipped '{}' (location taken)", existing.display_name)
            }
            Err(e) => eprintln!("  error: {e}"),
        }
    }
}

fn export_flow(repo: &TestRepository<FileStore>) {
    let project = prompt("Project to export: ");
    let records = repo.by_project(&project);
    if records.is_empty() {
        println!("No tests for '{project}'.");
        return;
    }

    let document = transfer::export(&project, &records);
    let json = match serde_json::to_string_pretty(&document) {
        Ok(json) => json,
        Err(e) => {
            eprintln!("Error: {e}");
            return;
        }
    };

    let path = prompt("Write to file: ");
    match fs::write(&path, json) {
        Ok(()) => println!("Exported {} test(s) to {path}.", document.test_count),
        Err(e) => eprintln!("Error: failed to write {path}: {e}"),
    }
}

fn import_flow(repo: &mut TestRepository<FileStore>) {
    let path = prompt("Import file: ");
    let json = match fs::read_to_string(&path) {
        Ok(json) => json,
        Err(e) => {
            eprintln!("Error: failed to read {path}: {e}");
            return;
        }
    };

    let document = match transfer::parse_document(&json) {
        Ok(document) => document,
        Err(e) => {
            eprintln!("Error: {e}");
            return;
        }
    };

    let summary = transfer::import(&document, &repo.list());
    let mut saved = 0;
    let mut skipped = summary.skipped;
    for record in summary.imported {
        match repo.save(record) {
            Ok(SaveOutcome::Saved(_)) => saved += 1,
            Ok(SaveOutcome::Conflict { .. }) => skipped += 1,
            Err(e) => {
                eprintln!("  error: {e}");
                skipped += 1;
            }
        }
    }
    println!("Imported {saved} test(s), skipped {skipped}.");
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    println!("Rebound CLI - Hammer Test Processor");
    println!("===================================");
    println!();

    let mut session = Session::new();
    let mut repo = TestRepository::new(FileStore::new(STORE_FILE));
    log::info!("record store at {STORE_FILE}");

    loop {
        println!();
        println!("[c]alculate  [o]rientation  [l]ist  [d]elete");
        println!("[s]hare  [r]eceive share  [e]xport  [i]mport  [q]uit");
        match prompt("> ").as_str() {
            "c" => run_calculation(&session, &mut repo),
            "o" => pick_orientation(&mut session),
            "l" => list_tests(&repo),
            "d" => delete_flow(&mut repo),
            "s" => share_flow(&repo),
            "r" => receive_share_flow(&mut session, &mut repo),
            "e" => export_flow(&repo),
            "i" => import_flow(&mut repo),
            "q" | "" => break,
            other => println!("Unknown command '{other}'."),
        }
    }
}
