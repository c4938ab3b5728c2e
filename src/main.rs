/*
 * Molecules
 *
 * A molecular background animation: drifting points linked by proximity
 * lines, pushed away by the pointer and coloured by the active theme.
 *
 * The control panel adjusts the settings in real time; they are saved to the
 * user's config directory and restored on the next start.
 */

use molecules::app;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    nannou::app(app::model)
        .update(app::update)
        .exit(app::exit)
        .run();
}
