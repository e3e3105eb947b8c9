use lispy::{cmdline, Environment};

fn main() {
    pretty_env_logger::init();
    let env = Environment::standard();
    let args = std::env::args().collect();
    if let Err(e) = cmdline::launch(args, &env) {
        eprintln!("{}", cmdline::render_error(&e));
        std::process::exit(1);
    }
}
