//! Console messages shown to operators.
//!
//! All messages are in Portuguese (Brazilian), matching the installed base of
//! the node's serial console.
//!
//! # Usage
//!
//! ```
//! use doorman_node::messages::ConsoleMessages;
//!
//! assert_eq!(ConsoleMessages::ACCESS_GRANTED, "Acesso liberado!");
//! ```

/// Console messages (Portuguese/Brazilian)
pub struct ConsoleMessages;

impl ConsoleMessages {
    /// Main menu, rendered before every command
    pub const MENU: &'static str = "\n=== MENU PRINCIPAL ===\n\
        1 - Cadastrar Usuário\n\
        2 - Listar Usuários\n\
        3 - Listar Eventos\n\
        4 - Liberar porta 1\n\
        5 - Liberar porta 2\n\
        Escolha uma opção: ";

    pub const INVALID_OPTION: &'static str = "Opção inválida!";

    // Registration
    pub const REGISTER_HEADER: &'static str = "=== CADASTRO DE USUÁRIO ===";
    pub const PROMPT_NAME: &'static str = "Nome: ";
    pub const PROMPT_PASSWORD: &'static str = "Senha: ";
    pub const PROMPT_ADMIN: &'static str = "Admin (1 - Sim, 0 - Não): ";
    pub const USER_REGISTERED: &'static str = "Usuário cadastrado com sucesso!";
    pub const USER_LIMIT_REACHED: &'static str = "Número máximo de usuários atingido!";
    pub const USER_NOT_SAVED: &'static str = "Erro ao salvar usuário!";

    // Listings
    pub const USERS_HEADER: &'static str = "=== USUÁRIOS CADASTRADOS ===";
    pub const NO_USERS: &'static str = "Nenhum usuário cadastrado!";
    pub const EVENTS_HEADER: &'static str = "=== EVENTOS ===";
    pub const NO_EVENTS: &'static str = "Nenhum evento registrado!";
    pub const NOT_REGISTERED: &'static str = "[Não cadastrado]";

    // Access
    pub const PROMPT_ACCESS_PASSWORD: &'static str = "Digite a senha: ";
    pub const INVALID_PASSWORD: &'static str = "Acesso negado! Senha invalida.";
    pub const ADMIN_ONLY: &'static str = "Acesso negado! Somente administradores.";
    pub const ACCESS_GRANTED: &'static str = "Acesso liberado!";
    pub const DOOR_ALREADY_OPEN: &'static str = "Porta já está aberta.";
    pub const DOOR_CLOSED: &'static str = "Porta fechada.";
    pub const DOOR_OVERRIDDEN: &'static str = "Porta acionada remotamente durante a liberação.";
    pub const DOOR_FAILURE: &'static str = "Erro ao acionar a porta!";
}
