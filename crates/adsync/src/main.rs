fn main() -> anyhow::Result<()> {
    adsync::init();

    adsync::cli::run()
}
