use tracing::{error, info};
use zskiplist::{observability, Member, SkipListConfig};

fn main() {
    let mut config = match std::env::args().nth(1) {
        Some(path) => match SkipListConfig::from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => SkipListConfig::default(),
    };
    config.apply_env();
    observability::init_tracing(&config.log);

    let mut list = config.build();
    for (score, member) in [(1.0, "a"), (2.0, "b"), (3.0, "c"), (3.0, "d"), (5.0, "e")] {
        if let Err(e) = list.try_insert(score, Member::from(member)) {
            error!(score, member, error = %e, "insert failed");
            std::process::exit(1);
        }
    }
    info!(count = list.len(), level = list.level(), "populated");

    let show = |members: Vec<&Member>| -> Vec<String> {
        members.into_iter().map(|m| m.to_string()).collect()
    };
    println!("rank_of(3, c) = {:?}", list.rank_of(3.0, b"c"));
    println!("rank_of(3, d) = {:?}", list.rank_of(3.0, b"d"));
    println!("score_range(2, 3) = {:?}", show(list.score_range(2.0, 3.0)));
    println!("rank_range(5, 3) = {:?}", show(list.rank_range(5, 3)));

    let removed = list.delete_by_rank(2, 3, |member| info!(member = %member, "removed"));
    println!("delete_by_rank(2, 3) removed {}", removed);

    let stdout = std::io::stdout();
    if let Err(e) = list.dump(&mut stdout.lock()) {
        error!(error = %e, "dump failed");
    }
}
