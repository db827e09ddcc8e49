use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use geotutor_config::AppConfig;
use geotutor_engine::session::{ProjectPatch, ProjectStore, SceneUpdate};
use geotutor_io::{JsonFileArchive, parse_document};

/// 会话数据来源，便于前端呈现加载信息。
#[derive(Debug, Clone)]
pub enum SessionSource {
    /// 从已有存档恢复。
    Archive(PathBuf),
    /// 从 `GEOTUTOR_SAMPLE_DOC` 指定的候选文档构建。
    SampleDocument(PathBuf),
    /// 内置演示会话。
    Demo,
}

/// 统一封装启动后的会话仓库与元信息。
pub struct LoadedSession {
    pub store: ProjectStore<JsonFileArchive>,
    pub source: SessionSource,
}

/// 启动引导：从配置的存档恢复会话仓库；存档为空时由这里负责补建会话
/// （Store 自身不自动补建）。若设置了 `GEOTUTOR_SAMPLE_DOC`，把该文件
/// 当作候选文档归一化进新会话；否则填充内置演示。
pub fn bootstrap(config: &AppConfig) -> LoadedSession {
    let path = config.storage.projects_path.clone();
    let archive = JsonFileArchive::new(&path);
    let mut store = ProjectStore::load_or_default(archive);

    if !store.is_empty() {
        info!(path = %path.display(), count = store.len(), "从存档恢复会话");
        return LoadedSession {
            store,
            source: SessionSource::Archive(path),
        };
    }

    if let Some(sample) = env::var_os("GEOTUTOR_SAMPLE_DOC") {
        let sample_path = PathBuf::from(sample);
        match load_sample_document(&sample_path, &mut store) {
            Ok(()) => {
                info!(path = %sample_path.display(), "已从候选文档构建会话");
                return LoadedSession {
                    store,
                    source: SessionSource::SampleDocument(sample_path),
                };
            }
            Err(message) => {
                warn!(path = %sample_path.display(), error = %message, "加载候选文档失败，回退到内置演示");
            }
        }
    }

    store.populate_demo();
    LoadedSession {
        store,
        source: SessionSource::Demo,
    }
}

fn load_sample_document(
    path: &Path,
    store: &mut ProjectStore<JsonFileArchive>,
) -> Result<(), String> {
    let text = fs::read_to_string(path).map_err(|err| err.to_string())?;
    let scene = parse_document(&text).map_err(|err| err.to_string())?;
    let id = store.create(Some("导入的几何问题"));
    store.update(
        id,
        ProjectPatch {
            scene: Some(SceneUpdate::Generated(scene)),
            ..ProjectPatch::default()
        },
    );
    Ok(())
}
