use std::process::ExitCode;

fn main() -> ExitCode {
  wishlist_lib::run()
}
