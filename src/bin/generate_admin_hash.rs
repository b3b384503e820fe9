//! Prints a bcrypt hash for `APP_ADMIN_PASSWORD_HASH`.
//!
//! Usage: `generate_admin_hash <password>`

use photo_portfolio::auth::password::hash_password;

fn main() {
    let Some(password) = std::env::args().nth(1) else {
        eprintln!("Usage: generate_admin_hash <password>");
        std::process::exit(2);
    };

    match hash_password(&password) {
        Ok(hash) => {
            println!("{}", hash);
            eprintln!("Set APP_ADMIN_PASSWORD_HASH to the value above.");
        }
        Err(e) => {
            eprintln!("Failed to hash password: {}", e);
            std::process::exit(1);
        }
    }
}
