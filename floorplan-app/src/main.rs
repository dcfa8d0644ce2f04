use std::path::PathBuf;

use floorplan_config::{AppConfig, ConfigError};
use floorplan_engine::scene::{Scene, SceneSettings};
use floorplan_io::{JsonProjectFacade, ProjectLoader, ProjectSaver};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

mod cli;

fn main() {
    let mut args = std::env::args().skip(1);
    let mut config_override: Option<PathBuf> = None;
    let mut load_path: Option<PathBuf> = None;
    let mut save_path: Option<PathBuf> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let Some(path) = args.next() else {
                    eprintln!("`--config` 需要提供配置文件路径");
                    std::process::exit(1);
                };
                config_override = Some(PathBuf::from(path));
            }
            "--load" => {
                let Some(path) = args.next() else {
                    eprintln!("`--load` 需要提供项目文件路径");
                    std::process::exit(1);
                };
                load_path = Some(PathBuf::from(path));
            }
            "--save" => {
                let Some(path) = args.next() else {
                    eprintln!("`--save` 需要提供项目文件路径");
                    std::process::exit(1);
                };
                save_path = Some(PathBuf::from(path));
            }
            other => {
                eprintln!("未知参数：{other}");
                std::process::exit(1);
            }
        }
    }

    let config = load_configuration(config_override);
    init_logging(&config);
    info!("启动户型编辑引擎");

    let mut scene = Scene::with_settings(SceneSettings::from_config(&config));
    let facade = JsonProjectFacade::new();

    match load_path {
        Some(path) => match facade.load(&path) {
            Ok(plan) => scene.load_plan(plan),
            Err(err) => {
                error!(path = %path.display(), error = %err, "加载项目失败");
                std::process::exit(1);
            }
        },
        None => {
            if let Some((width, depth)) = config.site.dimensions() {
                if let Err(err) = scene.set_site_dimensions(width, depth) {
                    warn!(width, depth, error = %err, "配置中的场地尺寸无效，使用演示场地");
                }
            }
            if let Err(err) = cli::populate_demo(&mut scene) {
                error!(error = %err, "构建演示方案失败");
                std::process::exit(1);
            }
        }
    }

    cli::print_summary(&scene);

    if let Some(path) = save_path {
        if let Err(err) = facade.save(scene.plan(), &path) {
            error!(path = %path.display(), error = %err, "保存项目失败");
            std::process::exit(1);
        }
        println!("项目已保存到 {}", path.display());
    }
}

fn load_configuration(override_path: Option<PathBuf>) -> AppConfig {
    match override_path {
        Some(path) => AppConfig::from_file(&path).unwrap_or_else(|err| {
            warn!(path = %path.display(), error = %err, "加载指定配置失败，使用默认配置");
            AppConfig::default()
        }),
        None => match AppConfig::discover() {
            Ok(cfg) => cfg,
            Err(err) => {
                match &err {
                    ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } => {
                        warn!(path = %path.display(), error = %err, "加载默认配置失败，使用内建默认值");
                    }
                    ConfigError::Context { .. } => {
                        warn!(error = %err, "加载默认配置失败，使用内建默认值");
                    }
                }
                AppConfig::default()
            }
        },
    }
}

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_new(config.logging.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}
