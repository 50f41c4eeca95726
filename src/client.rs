//! 클라이언트 (수신자)
//!
//! - 롱 헤더 패킷 1회로 연결 수립
//! - 수신하는 숏 헤더 패킷마다 플로우 카운터 갱신 + ACK 회신
//! - 모든 플로우가 목표 크기에 도달하면 루프 종료
//!
//! 와이어에는 종료 신호가 없다. 플로우 수와 플로우 크기를 서버와 공유하는
//! 설정으로 미리 알고 있다는 전제로 바이트 수만 보고 완료를 판정한다.

use bytes::Bytes;
use tokio::net::UdpSocket;
use tracing::{debug, info, warn};

use crate::flow::Flow;
use crate::packet::{generate_connection_id, generate_packet_number, LongHeader, ShortHeader};
use crate::{Config, Result};

/// 연결 수립 패킷의 인사말 페이로드
const GREETING: &[u8] = b"hello from qft client";

/// QFT 클라이언트
pub struct Client {
    config: Config,
    socket: UdpSocket,
}

impl Client {
    /// 임의 로컬 포트에 바인드된 클라이언트 생성
    ///
    /// 소켓은 서버 주소로 connect해 둔다. 다른 피어의 데이터그램은 커널이
    /// 걸러내고, 소켓 에러는 이후의 송수신 호출에 드러난다.
    pub async fn connect(config: Config) -> Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket.connect(config.server_addr).await?;
        debug!("클라이언트 바인드: {}", socket.local_addr()?);

        Ok(Self { config, socket })
    }

    /// 전송 수신 루프 실행. 완료된 플로우 목록을 반환
    pub async fn run(&mut self) -> Result<Vec<Flow>> {
        let connection_id = generate_connection_id();
        let packet_number = generate_packet_number();

        let hello = LongHeader {
            connection_id,
            packet_number,
            flow_id: 0,
            payload: Bytes::from_static(GREETING),
        };

        info!(
            "연결 수립 패킷 전송: connection_id={}, packet_number={}",
            connection_id, packet_number
        );
        self.socket.send(&hello.to_bytes()).await?;

        let num_flows = self.config.num_flows as usize;
        let mut flows: Vec<Flow> = Vec::new();

        // 플로우 ID는 1..=num_flows 연속 할당이 서버와의 공유 계약이다.
        // 완료 판정은 이 범위의 수신 바이트만 본다.
        let mut received_bytes = vec![0usize; num_flows + 1];

        let mut buf = vec![0u8; self.config.recv_buffer_size];

        loop {
            // 소켓 에러는 이 수신 단계에만 국한된다. 로그만 남기고 계속한다.
            let len = match self.socket.recv(&mut buf).await {
                Ok(len) => len,
                Err(e) => {
                    warn!("수신 에러: {}", e);
                    continue;
                }
            };

            let header = match ShortHeader::from_bytes(&buf[..len]) {
                Ok(h) => h,
                Err(e) => {
                    warn!("잘못된 패킷 무시: {}", e);
                    continue;
                }
            };

            // 처음 보는 플로우 ID는 기록용으로 새로 만든다.
            // 클라이언트측 chunk_size는 통계 기록용일 뿐 페이로드 해석에
            // 쓰이지 않으므로 서버 값과 일치할 필요가 없다.
            let idx = match flows.iter().position(|f| f.id == header.flow_id) {
                Some(idx) => idx,
                None => {
                    flows.push(Flow::new(
                        header.flow_id,
                        self.config.sample_chunk_size(),
                        self.config.flow_size,
                    ));
                    flows.len() - 1
                }
            };

            let flow = &mut flows[idx];
            let was_complete = flow.is_complete();
            flow.record_packet(header.payload.len());

            if let Some(counter) = received_bytes.get_mut(header.flow_id as usize) {
                *counter += header.payload.len();
            }

            let ack = ShortHeader::ack(header.packet_number, header.flow_id);
            if let Err(e) = self.socket.send(&ack.to_bytes()).await {
                warn!("ACK 전송 실패: {}", e);
            }

            if flow.is_complete() && !was_complete {
                info!(
                    "플로우 {} 완료: {} packets, {} bytes",
                    flow.id, flow.total_packets, flow.total_bytes
                );
            }

            if (1..=num_flows).all(|id| received_bytes[id] >= self.config.flow_size) {
                info!("모든 플로우 수신 완료 ({}개)", num_flows);
                break;
            }
        }

        Ok(flows)
    }
}
