use std::sync::Arc;

use fltk::{app, prelude::*};

use quill_pad::app::{
    ClientConfig, Executor, FileStorage, Flow, HttpRenderService, Message, RenderService,
    SessionController, Storage, detect_system_dark_mode,
};
use quill_pad::ui::{FltkSink, main_window::build_main_window, menu::build_menu, view::View};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ClientConfig::load();
    log::info!("rendering server: {}", config.server_url);

    let storage: Arc<dyn Storage> = Arc::new(FileStorage::new(ClientConfig::data_dir()));
    let service: Arc<dyn RenderService> = Arc::new(HttpRenderService::new(
        &config.server_url,
        config.request_timeout_secs,
        config.generate_timeout_secs,
    ));

    let app = app::App::default().with_scheme(app::Scheme::Gtk);
    let (sender, receiver) = app::channel::<Message>();

    let mut session = SessionController::new(config, storage, detect_system_dark_mode());

    let mut widgets = build_main_window(&sender, session.settings());
    build_menu(&mut widgets.menu, &sender, session.dark_mode());
    let mut view = View::new(widgets, &sender);
    let mut executor = Executor::new(service, FltkSink::new(sender));

    view.show();
    let effects = session.start();
    executor.run(effects);
    view.render(&session);

    while app.wait() {
        let mut handled = false;
        while let Some(msg) = receiver.recv() {
            handled = true;
            let effects = session.handle(msg);
            if executor.run(effects) == Flow::Quit {
                app.quit();
            }
        }
        if handled {
            view.render(&session);
        }
    }
}
