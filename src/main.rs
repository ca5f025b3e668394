fn main() -> std::process::ExitCode {
    dyna_lib::run()
}
