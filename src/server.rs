//! 서버 (송신자)
//!
//! - 미등록 피어의 첫 패킷을 롱 헤더로 해석해 연결과 플로우를 생성
//! - 플로우를 하나씩 순서대로 끝까지 전송 (플로우 간 인터리빙 없음)
//! - 패킷마다 고정 페이싱 지연 삽입
//! - 등록된 피어의 숏 헤더 중 ACK만 기록
//!
//! 전송은 수신 루프 안에서 동기적으로 진행되므로 한 연결의 전송이 끝나야
//! 다음 데이터그램을 볼 수 있다. 단일 클라이언트 전제의 의도된 단순화다.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::UdpSocket;
use tracing::{debug, info, warn};

use crate::connection::ConnectionRegistry;
use crate::packet::{LongHeader, ShortHeader};
use crate::{Config, Result};

/// QFT 서버
pub struct Server {
    config: Config,
    socket: UdpSocket,
    registry: ConnectionRegistry,
}

impl Server {
    /// 설정된 주소에 바인드된 서버 생성
    pub async fn bind(config: Config) -> Result<Self> {
        let socket = UdpSocket::bind(config.server_addr).await?;
        info!("QFT server listening on {}", socket.local_addr()?);

        Ok(Self {
            config,
            socket,
            registry: ConnectionRegistry::new(),
        })
    }

    /// 실제 바인드된 주소 (포트 0 바인드 시 필요)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// 연결 레지스트리 참조 (가변, ACK 구독용)
    pub fn registry_mut(&mut self) -> &mut ConnectionRegistry {
        &mut self.registry
    }

    /// 수신 루프 실행
    ///
    /// 데이터그램 단위 에러(소켓 에러, 짧은 패킷 등)는 해당 수신 단계에
    /// 국한된다. 로그만 남기고 루프를 계속한다.
    pub async fn run(&mut self) -> Result<()> {
        let mut buf = vec![0u8; self.config.recv_buffer_size];

        loop {
            let (len, peer) = match self.socket.recv_from(&mut buf).await {
                Ok(received) => received,
                Err(e) => {
                    warn!("수신 에러: {}", e);
                    continue;
                }
            };
            debug!("{} 바이트 수신: {}", len, peer);

            if let Err(e) = self.handle_datagram(&buf[..len], peer).await {
                warn!("데이터그램 처리 실패 ({}): {}", peer, e);
            }
        }
    }

    async fn handle_datagram(&mut self, data: &[u8], peer: SocketAddr) -> Result<()> {
        if !self.registry.contains(&peer) {
            let header = LongHeader::from_bytes(data)?;
            info!(
                "새 연결: peer={}, connection_id={}, packet_number={}, payload {} bytes",
                peer,
                header.connection_id,
                header.packet_number,
                header.payload.len()
            );

            self.registry.register(peer, &header, &self.config);
            self.transfer(peer).await?;
        } else {
            // 등록된 피어의 트래픽은 전부 숏 헤더로 해석한다
            let header = ShortHeader::from_bytes(data)?;

            if header.is_ack() {
                debug!(
                    "ACK 수신: peer={}, flow={}, packet_number={}",
                    peer, header.flow_id, header.packet_number
                );
                self.registry
                    .record_ack(peer, header.flow_id, header.packet_number);
            }
        }

        Ok(())
    }

    /// 연결의 모든 플로우를 순서대로 끝까지 전송
    async fn transfer(&mut self, peer: SocketAddr) -> Result<()> {
        let pacing = Duration::from_micros(self.config.pacing_delay_us);

        let Some(connection) = self.registry.get_mut(&peer) else {
            return Ok(());
        };

        for send_flow in connection.flows.iter_mut() {
            let flow_id = send_flow.flow.id;
            info!(
                "플로우 {} 전송 시작: {} bytes, chunk {} bytes",
                flow_id, send_flow.flow.total_size, send_flow.flow.chunk_size
            );

            while let Some((seq, chunk)) = send_flow.next_chunk() {
                let packet = ShortHeader::new(seq, flow_id, chunk);
                self.socket.send_to(&packet.to_bytes(), peer).await?;

                if !pacing.is_zero() {
                    tokio::time::sleep(pacing).await;
                }
            }

            info!(
                "플로우 {} 전송 완료: {} packets, {} bytes, last_seq={}",
                flow_id,
                send_flow.flow.total_packets,
                send_flow.flow.total_bytes,
                send_flow.last_seq()
            );
        }

        if connection.all_flows_complete() {
            info!("연결 전송 완료: peer={}", peer);
        }
        Ok(())
    }
}
