use data_loader::DatasetPaths;
use std::collections::HashSet;
use std::path::Path;
use std::time::Instant;

fn main() {
    let paths = DatasetPaths::from_dir(Path::new("data/yelp_dataset"));

    println!("Scanning review dataset {:?}...\n", paths.review);

    let start = Instant::now();
    let mut reviews = 0usize;
    let mut users = HashSet::new();
    let mut businesses = HashSet::new();
    for record in paths.reviews().expect("Failed to open review dataset") {
        let record = record.expect("Malformed review record");
        users.insert(record.user_id);
        businesses.insert(record.business_id);
        reviews += 1;
    }
    let elapsed = start.elapsed();

    println!("=== Scan Complete ===");
    println!("Time taken: {:?}", elapsed);
    println!("Reviews: {}", reviews);
    println!("Distinct users: {}", users.len());
    println!("Distinct businesses: {}", businesses.len());
    println!("\nPerformance: {:.0} records/second",
             reviews as f64 / elapsed.as_secs_f64());
}
