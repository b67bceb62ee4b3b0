//! Console integration tests
//!
//! Each test drives a live console the way an operator would: it waits for a
//! prompt on the screen before typing the next line.

use std::sync::Arc;
use std::time::Duration;

use doorman_core::DoorId;
use doorman_hardware::mock::{MockActuator, MockButton};
use doorman_hardware::{ChannelLineSource, LineSender};
use doorman_node::{
    AccessCoordinator, Console, DoorController, DoorRegistry, ReleaseTiming, StartupGate,
    UserRegistry,
};
use doorman_storage::{MemoryStore, PersistenceWriter};
use tokio::io::{AsyncReadExt, DuplexStream};
use tokio::task::JoinHandle;
use tokio::time::timeout;

const PROMPT: &str = "Escolha uma opção: ";

/// Operator side of a console under test.
struct Terminal {
    keyboard: LineSender,
    screen: DuplexStream,
    unread: Vec<u8>,
}

impl Terminal {
    async fn type_line(&self, line: &str) {
        self.keyboard.send(line).await.unwrap();
    }

    /// Read until `needle` appears; returns everything up to and including it.
    async fn expect(&mut self, needle: &str) -> String {
        loop {
            if let Some(pos) = self
                .unread
                .windows(needle.len())
                .position(|window| window == needle.as_bytes())
            {
                let seen: Vec<u8> = self.unread.drain(..pos + needle.len()).collect();
                return String::from_utf8(seen).unwrap();
            }

            let mut chunk = [0u8; 1024];
            let n = timeout(Duration::from_secs(5), self.screen.read(&mut chunk))
                .await
                .unwrap_or_else(|_| {
                    panic!(
                        "timed out waiting for {needle:?}, screen: {:?}",
                        String::from_utf8_lossy(&self.unread)
                    )
                })
                .unwrap();
            assert!(n > 0, "console closed while waiting for {needle:?}");
            self.unread.extend_from_slice(&chunk[..n]);
        }
    }

    /// Answer a prompt.
    async fn answer(&mut self, prompt: &str, line: &str) {
        self.expect(prompt).await;
        self.type_line(line).await;
    }

    /// Register a user through menu option 1.
    async fn register(&mut self, name: &str, password: &str, admin: bool) {
        self.answer(PROMPT, "1").await;
        self.answer("Nome: ", name).await;
        self.answer("Senha: ", password).await;
        self.answer("Admin (1 - Sim, 0 - Não): ", if admin { "1" } else { "0" })
            .await;
        self.expect("Usuário cadastrado com sucesso!").await;
    }
}

struct Harness {
    terminal: Terminal,
    gate: StartupGate,
    console: JoinHandle<doorman_core::Result<()>>,
    doors: DoorController,
    locks: Vec<(Arc<MockActuator>, Arc<MockButton>)>,
}

fn start_console(gate: StartupGate) -> Harness {
    let store = MemoryStore::new();
    let (writer, queue) = PersistenceWriter::new(store.clone());
    tokio::spawn(writer.run());

    let (registry, locks) = DoorRegistry::mock();
    let doors = DoorController::new(
        registry,
        ReleaseTiming {
            open_time: Duration::from_millis(200),
            poll_interval: Duration::from_millis(10),
        },
    );
    let access = AccessCoordinator::new(
        Arc::new(UserRegistry::new()),
        doors.clone(),
        queue,
        store,
    );

    let (input, keyboard) = ChannelLineSource::channel(16);
    let (output, screen) = tokio::io::duplex(64 * 1024);
    let console = tokio::spawn(Console::new(input, output, access, gate.clone()).run());

    Harness {
        terminal: Terminal {
            keyboard,
            screen,
            unread: Vec::new(),
        },
        gate,
        console,
        doors,
        locks,
    }
}

#[tokio::test]
async fn test_console_waits_for_gate() {
    let mut h = start_console(StartupGate::new());

    let mut chunk = [0u8; 64];
    let early = timeout(
        Duration::from_millis(100),
        h.terminal.screen.read(&mut chunk),
    )
    .await;
    assert!(early.is_err(), "console rendered before the gate opened");

    h.gate.open();
    let menu = h.terminal.expect(PROMPT).await;
    assert!(menu.contains("=== MENU PRINCIPAL ==="));
    assert!(menu.contains("5 - Liberar porta 2"));
}

#[tokio::test]
async fn test_register_and_list_masks_passwords() {
    let mut h = start_console(StartupGate::opened());

    h.terminal.register("alice", "pw1", true).await;
    h.terminal.register("bob", "segredo", false).await;

    h.terminal.answer(PROMPT, "2").await;
    let listing = h.terminal.expect("Admin: Não").await;

    assert!(listing.contains("=== USUÁRIOS CADASTRADOS ==="));
    assert!(listing.contains("1. Nome: alice | Senha: **** | Admin: Sim"));
    assert!(listing.contains("2. Nome: bob | Senha: **** | Admin: Não"));
    assert!(!listing.contains("pw1"));
    assert!(!listing.contains("segredo"));
}

#[tokio::test]
async fn test_empty_user_list() {
    let mut h = start_console(StartupGate::opened());

    h.terminal.answer(PROMPT, "2").await;
    h.terminal.expect("Nenhum usuário cadastrado!").await;
}

#[tokio::test]
async fn test_invalid_registration_input() {
    let mut h = start_console(StartupGate::opened());

    h.terminal.answer(PROMPT, "1").await;
    h.terminal.answer("Nome: ", "a-name-well-over-nineteen-bytes").await;
    h.terminal.answer("Senha: ", "pw").await;
    h.terminal.answer("Admin (1 - Sim, 0 - Não): ", "0").await;
    h.terminal.expect("Erro ao salvar usuário!").await;

    h.terminal.answer(PROMPT, "2").await;
    h.terminal.expect("Nenhum usuário cadastrado!").await;
}

#[tokio::test]
async fn test_door_release_flow() {
    let mut h = start_console(StartupGate::opened());
    h.terminal.register("alice", "pw1", false).await;

    h.terminal.answer(PROMPT, "4").await;
    h.terminal.answer("Digite a senha: ", "wrong").await;
    h.terminal.expect("Acesso negado! Senha invalida.").await;
    assert_eq!(h.locks[0].0.set_calls(), 0);

    h.terminal.answer(PROMPT, "4").await;
    h.terminal.answer("Digite a senha: ", "pw1").await;
    h.terminal.expect("Acesso liberado!").await;
    h.terminal.expect("Porta fechada.").await;

    // Driven high for the release, low again afterwards.
    assert_eq!(h.locks[0].0.set_calls(), 2);
    assert!(!h.locks[0].0.is_energized());
    assert_eq!(h.locks[1].0.set_calls(), 0);
}

#[tokio::test]
async fn test_button_closes_door_early() {
    let mut h = start_console(StartupGate::opened());
    h.terminal.register("alice", "pw1", false).await;

    h.terminal.answer(PROMPT, "5").await;
    h.terminal.answer("Digite a senha: ", "pw1").await;
    h.terminal.expect("Acesso liberado!").await;

    h.locks[1].1.hold();
    h.terminal.expect("Porta fechada.").await;
    assert!(!h.locks[1].0.is_energized());
}

#[tokio::test]
async fn test_release_of_open_door_is_not_granted() {
    let mut h = start_console(StartupGate::opened());
    h.terminal.register("root", "adm", true).await;
    h.doors.force_set(DoorId::ONE, true).await.unwrap();

    h.terminal.answer(PROMPT, "4").await;
    h.terminal.answer("Digite a senha: ", "adm").await;
    let reply = h.terminal.expect("Porta já está aberta.").await;
    assert!(!reply.contains("Acesso liberado!"));
    assert_eq!(h.locks[0].0.set_calls(), 1);

    h.terminal.answer(PROMPT, "3").await;
    h.terminal.answer("Digite a senha: ", "adm").await;
    h.terminal.expect("Nenhum evento registrado!").await;
}

#[tokio::test]
async fn test_event_listing_requires_admin() {
    let mut h = start_console(StartupGate::opened());
    h.terminal.register("root", "adm", true).await;
    h.terminal.register("bob", "usr", false).await;

    h.terminal.answer(PROMPT, "5").await;
    h.terminal.answer("Digite a senha: ", "usr").await;
    h.terminal.expect("Porta fechada.").await;

    h.terminal.answer(PROMPT, "3").await;
    h.terminal.answer("Digite a senha: ", "usr").await;
    h.terminal.expect("Acesso negado! Somente administradores.").await;

    h.terminal.answer(PROMPT, "3").await;
    h.terminal.answer("Digite a senha: ", "nope").await;
    h.terminal.expect("Acesso negado! Senha invalida.").await;

    h.terminal.answer(PROMPT, "3").await;
    h.terminal.answer("Digite a senha: ", "adm").await;
    let listing = h.terminal.expect("| Porta: 2").await;
    assert!(listing.contains("=== EVENTOS ==="));
    assert!(listing.contains("1. Usuário: bob (Usuário) | Porta: 2"));
}

#[tokio::test]
async fn test_invalid_option() {
    let mut h = start_console(StartupGate::opened());

    h.terminal.answer(PROMPT, "9").await;
    h.terminal.expect("Opção inválida!").await;
    h.terminal.expect(PROMPT).await;
}

#[tokio::test]
async fn test_end_of_input_stops_console() {
    let mut h = start_console(StartupGate::opened());
    h.terminal.expect(PROMPT).await;

    drop(h.terminal.keyboard);
    timeout(Duration::from_secs(5), h.console)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}
