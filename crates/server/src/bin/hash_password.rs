//! Print an argon2 hash for seeding staff accounts directly in SQL.

fn main() {
    let password = std::env::args().nth(1).unwrap_or_else(|| "courtwise-dev".to_string());
    match server::auth::password::hash_password(&password) {
        Ok(hash) => println!("{hash}"),
        Err(e) => {
            eprintln!("failed to hash password: {e}");
            std::process::exit(1);
        }
    }
}
