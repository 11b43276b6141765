use clap::Parser;
use colored::*;
use tracing_subscriber::EnvFilter;

use variants::active::ActiveTestCache;
use variants::catalog::{TestCatalog, TestRecord, TestStatus};
use variants::cli::Args;
use variants::registry::VariantRegistry;
use variants::render::rewrite_page;
use variants::settings::TestSettings;
use variants::{
    clear_stale_assignment, Assignment, AssignmentStore, BucketingController, FileStore, Group,
    MemoryStore, SeededDraw, ThreadRngDraw, TrafficDraw,
};

const CONTROL_HTML: &str = "<p>control experience</p>";
const VARIANT_HTML: &str = "<p>variant experience</p>";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    if args.no_active {
        simulate_no_active_test(&args.slug);
        return Ok(());
    }

    // Editorial state: one published test driving the requested slug.
    let mut catalog = TestCatalog::new();
    catalog.insert(TestRecord {
        id: 1,
        title: format!("{} test", args.slug),
        status: TestStatus::Published,
        settings: TestSettings::new(&args.slug)
            .with_traffic_percentage(i64::from(args.traffic)),
    });

    let mut registry = VariantRegistry::new();
    registry.register(&args.slug, "Simulated variant", |_, _| {
        Some(VARIANT_HTML.to_string())
    });

    let mut cache = ActiveTestCache::default();
    let page = registry.display(&args.slug, CONTROL_HTML, &catalog, &mut cache, 0);

    println!("{}", "── rendered placeholder ──".bright_blue());
    println!("{}", page.dimmed());

    let mut draw: Box<dyn TrafficDraw> = match args.seed {
        Some(seed) => Box::new(SeededDraw::new(seed)),
        None => Box::new(ThreadRngDraw),
    };

    let returning = args.returning || args.store.is_some();
    let variant_views = if returning {
        let mut store: Box<dyn AssignmentStore> = match &args.store {
            Some(path) => Box::new(FileStore::open(path)?),
            None => Box::new(MemoryStore::new()),
        };
        run_returning_visitor(&page, args.views, &mut *store, &mut *draw)?
    } else {
        run_fresh_visitors(&page, args.views, &mut *draw)?
    };

    print_summary(&args, returning, variant_views);
    Ok(())
}

/// One visitor reloading the page: the first view draws, the rest replay the
/// persisted assignment.
fn run_returning_visitor(
    page: &str,
    views: u32,
    store: &mut dyn AssignmentStore,
    draw: &mut dyn TrafficDraw,
) -> Result<u32, Box<dyn std::error::Error>> {
    let mut variant_views = 0;
    for _ in 0..views {
        let mut controller = BucketingController::new(&mut *store, &mut *draw);
        let html = rewrite_page(page, &mut controller)?;
        if html.contains(VARIANT_HTML) {
            variant_views += 1;
        }
    }
    Ok(variant_views)
}

/// Independent visitors, each with an empty store, so every view draws.
fn run_fresh_visitors(
    page: &str,
    views: u32,
    draw: &mut dyn TrafficDraw,
) -> Result<u32, Box<dyn std::error::Error>> {
    let mut variant_views = 0;
    for _ in 0..views {
        let mut controller = BucketingController::new(MemoryStore::new(), &mut *draw);
        let html = rewrite_page(page, &mut controller)?;
        if html.contains(VARIANT_HTML) {
            variant_views += 1;
        }
    }
    Ok(variant_views)
}

/// Page load with no active test: seed a leftover assignment, then run the
/// page-start cleanup guard against the zero active-test signal.
fn simulate_no_active_test(slug: &str) {
    let mut store = MemoryStore::new();
    Assignment {
        group: Group::Variant,
        test_type: slug.to_string(),
    }
    .save(&mut store);

    let cleared = clear_stale_assignment(&mut store, 0);

    println!("{}", "── no active test ──".bright_blue());
    if cleared {
        println!(
            "  leftover assignment for {} {}",
            slug.bright_yellow(),
            "cleared".bright_green()
        );
    } else {
        println!("  nothing to clear");
    }
}

fn print_summary(args: &Args, returning: bool, variant_views: u32) {
    let views = args.views.max(1);
    let control_views = args.views.saturating_sub(variant_views);
    let share = 100.0 * f64::from(variant_views) / f64::from(views);

    println!("{}", "── bucketing summary ──".bright_blue());
    println!(
        "  mode: {}",
        if returning {
            "returning visitor".bright_yellow()
        } else {
            "fresh visitors".bright_yellow()
        }
    );
    println!("  views: {}", args.views);
    println!(
        "  control: {}  variant: {}",
        control_views.to_string().bright_green(),
        variant_views.to_string().bright_magenta()
    );
    // The draw keeps a visitor on control when r <= traffic, so the realized
    // variant share trends toward (100 - traffic) percent across visitors.
    println!(
        "  realized variant share: {:.1}% (gate {}%)",
        share, args.traffic
    );
}
