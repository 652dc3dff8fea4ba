use clap::{ArgGroup, Parser};
use schemasync::config::{expand_home, AuthMethod, LogConfig, RemoteConfig, SyncJob};
use schemasync::{logging, SyncEngine};
use std::path::PathBuf;
use tracing::{error, info, warn};

/// 把本地的 XML Schema / DTD 文件推送到远端 htdocs 目录
#[derive(Parser)]
#[command(name = "schemasync", version, about = "Push XML schema and DTD files to a remote htdocs directory over SFTP")]
#[command(group(ArgGroup::new("auth").required(true).args(["password", "passphrase"])))]
struct Cli {
    /// 登录用户名
    #[arg(short, long, default_value = "schema")]
    user: String,

    /// 私钥路径
    #[arg(short, long, default_value = "~/.ssh/id_rsa")]
    identity: String,

    /// 目标主机
    #[arg(short = 'H', long, default_value = "filemgmt-prod.jboss.org")]
    host: String,

    /// 目标端口
    #[arg(short = 'n', long, default_value_t = 22)]
    port: u16,

    /// 远端基础目录
    #[arg(long = "remote-directory", default_value = "schema_htdocs/jbossas/")]
    remote_directory: String,

    /// 本地基础目录
    #[arg(long = "local-directory")]
    local_directory: PathBuf,

    /// 交互式输入登录密码（与 --passphrase 互斥）
    #[arg(short, long)]
    password: bool,

    /// 交互式输入私钥口令（与 --password 互斥）
    #[arg(long)]
    passphrase: bool,

    /// 将同步报告写入 JSON 文件
    #[arg(long)]
    report: Option<PathBuf>,

    /// 输出调试日志
    #[arg(short, long)]
    verbose: bool,
}

/// 将报告序列化后写入文件，失败只告警不中止
fn write_report(path: &std::path::Path, report: &schemasync::SyncReport) {
    let result = serde_json::to_string_pretty(report)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        .and_then(|json| std::fs::write(path, json));
    match result {
        Ok(()) => info!("报告已写入: {}", path.display()),
        Err(e) => warn!("写入报告 {} 失败: {}", path.display(), e),
    }
}

/// 提示输入凭据并组装同步任务
fn build_job(cli: &Cli) -> anyhow::Result<SyncJob> {
    let auth = if cli.password {
        let secret = rpassword::prompt_password("Password: ")?;
        AuthMethod::Password(secret)
    } else {
        let secret = rpassword::prompt_password("Passphrase: ")?;
        AuthMethod::KeyFile {
            path: expand_home(&cli.identity),
            passphrase: secret,
        }
    };

    Ok(SyncJob {
        local_dir: cli.local_directory.clone(),
        remote_dir: cli.remote_directory.clone(),
        remote: RemoteConfig {
            host: cli.host.clone(),
            port: cli.port,
            user: cli.user.clone(),
            auth,
            known_hosts: Some(expand_home("~/.ssh/known_hosts")),
            timeout_secs: 30,
        },
    })
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_dir = logging::log_dir();
    let log_config = LogConfig::load(&log_dir);
    // 首次运行落盘默认配置，便于用户调整日志级别
    if !log_dir.join("config.json").exists() {
        let _ = log_config.save(&log_dir);
    }
    let _guard = logging::init(&log_config, &log_dir, cli.verbose);

    let job = match build_job(&cli) {
        Ok(job) => job,
        Err(e) => {
            error!("读取凭据失败: {:#}", e);
            std::process::exit(2);
        }
    };

    info!(
        "推送 {} -> {}@{}:{}",
        job.local_dir.display(),
        job.remote.user,
        job.remote.host,
        job.remote_dir
    );

    let engine = SyncEngine::new();
    match engine.run(&job).await {
        Ok(report) => {
            info!(
                "同步成功: 扫描 {}，上传 {}，跳过 {}，索引 {} 个条目，耗时 {} 秒",
                report.files_scanned,
                report.files_uploaded,
                report.files_skipped,
                report.index_entries,
                report.duration_secs
            );
            if let Some(ref path) = cli.report {
                write_report(path, &report);
            }
        }
        Err(e) => {
            error!("同步失败 [{}]: {}", e.stage(), e);
            std::process::exit(1);
        }
    }
}
