fn main() {
    repopulse::app::startup::startup();
}
