use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    ranking_dataset::apps::run_build_ranking_dataset(std::env::args().skip(1))
}
