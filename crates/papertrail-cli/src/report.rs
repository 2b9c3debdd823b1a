//! Console run reports.

use papertrail_core::{DataPaths, QueryFailure};
use papertrail_graph::{CountryGraph, GraphBackend, TopicGraphs};
use papertrail_runtime::SweepReport;

pub fn print_sweep(sweep: &SweepReport, paths: &DataPaths) {
    println!("=== papertrail run ===");
    println!();
    println!("Started:            {}", sweep.started_at);
    println!("Finished:           {}", sweep.finished_at);
    println!("Country-year rows:  {}", sweep.country_year.len());
    println!("Countries:          {}", sweep.summary.len());
    println!("Subfield rows:      {}", sweep.subfield_year.len());
    println!("Topic graphs:       {}", sweep.topic_graphs.len());

    if let Some(top) = sweep.summary.first() {
        println!(
            "Largest:            {} ({} works, growth x{:.2}, slope {:.1}/yr)",
            top.country_code, top.total_count, top.growth_ratio, top.recent_slope
        );
    }

    print_failures(&sweep.failures);
    println!();
    println!("Outputs:            {}", paths.root.display());
}

pub fn print_graphs(graphs: &TopicGraphs, paths: &DataPaths) {
    println!("=== papertrail graph ===");
    println!();
    println!("Topic graphs:       {}", graphs.graphs.len());
    for (country, graph) in &graphs.graphs {
        println!("  {}", graph_line(country, graph));
    }

    print_failures(&graphs.failures);
    println!();
    println!("Outputs:            {}", paths.topic_graphs.display());
}

/// One-line shape of a country graph, or why it does not load.
fn graph_line(country: &str, graph: &CountryGraph) -> String {
    match GraphBackend::load(country, graph) {
        Ok(backend) => {
            let stats = backend.stats();
            format!(
                "{:<4} {} main, {} sub, {} links",
                country, stats.main_nodes, stats.sub_nodes, stats.edge_count
            )
        }
        Err(e) => format!("{:<4} invalid: {}", country, e),
    }
}

fn print_failures(failures: &[QueryFailure]) {
    if failures.is_empty() {
        return;
    }
    println!();
    println!("Failed queries ({}):", failures.len());
    for f in failures {
        let mut scope = Vec::new();
        if let Some(subfield) = &f.subfield {
            scope.push(subfield.clone());
        }
        if let Some(year) = f.year {
            scope.push(year.to_string());
        }
        if let Some(country) = &f.country {
            scope.push(country.clone());
        }
        println!("  - [{:?}] {} {}", f.pass, scope.join("/"), f.message);
    }
}
