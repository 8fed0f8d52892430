use anyhow::Result;
use dotenvy::dotenv;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info};

use fleet_management::config::environment::EnvironmentConfig;
use fleet_management::database;
use fleet_management::routes::create_app;
use fleet_management::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    info!("🚗 Fleet Management - API Web");
    info!("=============================");

    let config = EnvironmentConfig::from_env();

    // Inicializar base de datos
    let pool = match database::create_pool(None).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("❌ Error conectando a la base de datos: {}", e);
            return Err(anyhow::anyhow!("Error de base de datos: {}", e));
        }
    };

    if let Err(e) = database::run_migrations(&pool).await {
        error!("❌ Error ejecutando migraciones: {}", e);
        return Err(e);
    }
    info!("✅ Base de datos lista");

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let app = create_app(AppState::new(pool, config));

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health - Health check");
    info!("🔑 Auth:");
    info!("   POST /api/auth/login - Login");
    info!("🚗 Vehicles:");
    info!("   POST   /api/vehicle - Crear vehículo");
    info!("   GET    /api/vehicle - Listar vehículos (filtros: status, source, search)");
    info!("   GET    /api/vehicle/:id - Obtener vehículo");
    info!("   PUT    /api/vehicle/:id - Actualizar campos");
    info!("   POST   /api/vehicle/:id/status - Cambiar estado");
    info!("   DELETE /api/vehicle/:id - Eliminar vehículo (admin)");
    info!("👥 Customers:");
    info!("   POST   /api/customer - Crear cliente");
    info!("   GET    /api/customer - Listar clientes visibles");
    info!("   GET    /api/customer/:id - Obtener cliente");
    info!("   PUT    /api/customer/:id - Actualizar cliente");
    info!("   POST   /api/customer/:id/share - Compartir cliente");
    info!("   POST   /api/customer/:id/notes - Añadir nota");
    info!("   POST   /api/customer/:id/vehicles - Asignar vehículo");
    info!("   GET    /api/customer/:id/history - Historial");
    info!("   DELETE /api/customer/:id - Eliminar cliente (owner)");
    info!("👤 Users (admin):");
    info!("   POST /api/users - Invitar usuario");
    info!("   GET  /api/users - Listar usuarios");
    info!("   GET  /api/users/me - Perfil propio");
    info!("   PUT  /api/users/:id/role - Cambiar rol");
    info!("   PUT  /api/users/:id/status - Activar/desactivar");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!("❌ Error del servidor: {}", e);
            anyhow::anyhow!(e)
        })?;

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
