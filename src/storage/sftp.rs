//! SFTP 存储实现（基于 libssh2）
//!
//! libssh2 的调用全部是阻塞的，统一通过 spawn_blocking 包装，
//! 避免阻塞 async runtime。每次运行只建立一条会话。

use super::{RemoteEntry, RemoteStore};
use crate::config::{AuthMethod, RemoteConfig};
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use ssh2::{CheckResult, DisconnectCode, KnownHostFileKind, Session, Sftp};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

struct SftpInner {
    sftp: Sftp,
    session: Session,
    // 持有 TCP 连接，会话存活期间不能关闭
    _tcp: TcpStream,
}

pub struct SftpStore {
    inner: Arc<Mutex<SftpInner>>,
    name: String,
}

impl SftpStore {
    /// 建立 TCP 连接、完成握手与认证，打开 SFTP 子系统
    pub async fn connect(config: &RemoteConfig) -> Result<Self> {
        let name = format!("sftp://{}@{}:{}", config.user, config.host, config.port);
        info!("正在连接 {}", name);

        let cfg = config.clone();
        let inner = tokio::task::spawn_blocking(move || connect_blocking(&cfg)).await??;

        info!("SFTP 会话已建立: {}", name);
        Ok(Self {
            inner: Arc::new(Mutex::new(inner)),
            name,
        })
    }
}

fn connect_blocking(config: &RemoteConfig) -> Result<SftpInner> {
    let addr = format!("{}:{}", config.host, config.port);
    let sock_addr = addr
        .to_socket_addrs()
        .with_context(|| format!("无法解析地址 {}", addr))?
        .next()
        .ok_or_else(|| anyhow!("地址 {} 没有解析结果", addr))?;

    let tcp = TcpStream::connect_timeout(&sock_addr, Duration::from_secs(config.timeout_secs))
        .with_context(|| format!("TCP 连接 {} 失败", addr))?;

    let mut session = Session::new().context("创建 SSH 会话失败")?;
    session.set_tcp_stream(tcp.try_clone()?);
    session.handshake().context("SSH 握手失败")?;

    if let Some(ref known_hosts) = config.known_hosts {
        verify_host_key(&session, &config.host, config.port, known_hosts)?;
    }

    match config.auth {
        AuthMethod::Password(ref password) => {
            session
                .userauth_password(&config.user, password)
                .context("密码认证失败")?;
        }
        AuthMethod::KeyFile {
            ref path,
            ref passphrase,
        } => {
            session
                .userauth_pubkey_file(&config.user, None, path, Some(passphrase))
                .with_context(|| format!("私钥认证失败: {}", path.display()))?;
        }
    }

    if !session.authenticated() {
        bail!("认证未通过");
    }

    let sftp = session.sftp().context("打开 SFTP 子系统失败")?;

    Ok(SftpInner {
        sftp,
        session,
        _tcp: tcp,
    })
}

/// 根据 known_hosts 校验主机公钥
///
/// 密钥不匹配视为致命错误；主机未记录时仅告警放行。
fn verify_host_key(session: &Session, host: &str, port: u16, known_hosts: &Path) -> Result<()> {
    if !known_hosts.exists() {
        warn!("known_hosts 文件不存在，跳过主机校验: {}", known_hosts.display());
        return Ok(());
    }

    let mut store = session.known_hosts().context("初始化 known_hosts 失败")?;
    store
        .read_file(known_hosts, KnownHostFileKind::OpenSSH)
        .with_context(|| format!("读取 {} 失败", known_hosts.display()))?;

    let (key, _key_type) = session
        .host_key()
        .ok_or_else(|| anyhow!("无法获取主机公钥"))?;

    match store.check_port(host, port, key) {
        CheckResult::Match => {
            debug!("主机公钥校验通过: {}", host);
            Ok(())
        }
        CheckResult::NotFound => {
            warn!("{} 不在 known_hosts 中，继续连接", host);
            Ok(())
        }
        CheckResult::Mismatch => bail!("主机 {} 的公钥与 known_hosts 记录不一致", host),
        CheckResult::Failure => bail!("known_hosts 校验失败: {}", host),
    }
}

#[async_trait]
impl RemoteStore for SftpStore {
    async fn list_dir(&self, path: &str) -> Result<Vec<RemoteEntry>> {
        let inner = self.inner.clone();
        let path = path.to_string();

        tokio::task::spawn_blocking(move || {
            let guard = inner.lock().unwrap();
            let raw = guard
                .sftp
                .readdir(Path::new(&path))
                .with_context(|| format!("列出远端目录 {} 失败", path))?;

            let entries = raw
                .into_iter()
                .filter_map(|(entry_path, stat)| {
                    let name = entry_path.file_name()?.to_str()?.to_string();
                    if name == "." || name == ".." {
                        return None;
                    }
                    Some(RemoteEntry {
                        name,
                        size: stat.size.unwrap_or(0),
                        is_dir: stat.is_dir(),
                    })
                })
                .collect();

            Ok(entries)
        })
        .await?
    }

    async fn put_file(&self, local: &Path, remote: &str) -> Result<()> {
        let inner = self.inner.clone();
        let local = local.to_path_buf();
        let remote = remote.to_string();

        tokio::task::spawn_blocking(move || {
            let guard = inner.lock().unwrap();

            let mut src = std::fs::File::open(&local)
                .with_context(|| format!("打开本地文件 {} 失败", local.display()))?;
            let mut dst = guard
                .sftp
                .create(Path::new(&remote))
                .with_context(|| format!("创建远端文件 {} 失败", remote))?;

            let bytes = std::io::copy(&mut src, &mut dst)
                .with_context(|| format!("写入远端文件 {} 失败", remote))?;
            debug!("已写入 {} ({} 字节)", remote, bytes);

            Ok(())
        })
        .await?
    }

    async fn close(&self) -> Result<()> {
        let inner = self.inner.clone();

        tokio::task::spawn_blocking(move || {
            let guard = inner.lock().unwrap();
            guard
                .session
                .disconnect(Some(DisconnectCode::ByApplication), "会话结束", None)
                .context("断开 SSH 会话失败")?;
            Ok(())
        })
        .await?
    }

    fn name(&self) -> &str {
        &self.name
    }
}
