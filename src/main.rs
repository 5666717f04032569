use libadwaita as adw;

use adw::prelude::*;

mod app;
mod ui;

const APP_ID: &str = "org.example.Multicrop";

fn main() {
    env_logger::init();

    let app = adw::Application::builder().application_id(APP_ID).build();

    app.connect_activate(ui::build_ui);
    app.run();
}
