fn main() -> std::process::ExitCode {
    redmine_desk_lib::run()
}
