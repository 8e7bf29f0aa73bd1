use super::entity;

entity! {
    /// A managed property (`inmuebles`).
    Property {
        collection: "inmuebles",
        title: "Inmuebles",
        noun: "este inmueble",
        fields: {
            contrato: "Contrato" Text,
            areapredio: "Área predio" Text,
            direccion: "Dirección" Text,
            estrato: "Estrato" Text,
            // Wire key keeps the historical spelling.
            evaluoanteior: "Avalúo anterior" Text,
            evaluovigente: "Avalúo vigente" Text,
            fichacatastral: "Ficha catastral" Text,
            matricula: "Matrícula" Text,
            matriculaagua: "Matrícula agua" Text,
            matriculaenergia: "Matrícula energía" Text,
            arrendador: "Arrendador" Text,
            participacion: "Participación" Text,
        }
    }
}

entity! {
    /// A tenant or landlord contact (`clientes`).
    Client {
        collection: "clientes",
        title: "Clientes",
        noun: "este cliente",
        fields: {
            documento: "Documento" Text,
            contrato: "Contrato" Text,
            nombre: "Nombre" Text,
            direccion: "Dirección" Text,
            correo: "Correo" Text,
            celular: "Celular" Text,
            fijo: "Fijo" Text,
            ciudad: "Ciudad" Text,
        }
    }
}

entity! {
    /// A lease contract (`contratos`).
    Contract {
        collection: "contratos",
        title: "Contratos",
        noun: "este contrato",
        fields: {
            contrato: "Contrato" Text,
            arrendador: "Arrendador" Text,
            canon: "Canon" Text,
            valoriva: "Valor IVA" Text,
            mediopago: "Medio pago" Text,
            estado: "Estado" Text,
            valoradministracion: "Valor administración" Text,
            incrementoadmon: "Incremento admón." Text,
            incremento: "Incremento" Text,
            fecha: "Fecha" Text,
            fechaterminacion: "Fecha terminación" Text,
            fechapago: "Fecha pago" Text,
            descripcion: "Descripción" Text,
            preaviso: "Preaviso" Text,
        }
    }
}

entity! {
    /// A collections (portfolio) entry (`cartera`).
    PortfolioEntry {
        collection: "cartera",
        title: "Cartera",
        noun: "este registro",
        fields: {
            contrato: "Contrato" Text,
            fechainicio: "Fecha inicio" Text,
            fechaterminacion: "Fecha terminación" Text,
            incremento: "Incremento" Text,
            canon: "Canon" Text,
            arrendador: "Arrendador" Text,
            mediopago: "Medio pago" Text,
            valorarriendo: "Valor arriendo" Text,
            fechapago: "Fecha pago" Text,
            fecha: "Fecha" Text,
            estado: "Estado" Text,
            descripcion: "Descripción" Text,
            preaviso: "Preaviso" Text,
        }
    }
}

entity! {
    /// A file attached to a contract (`anexos`).
    Attachment {
        collection: "anexos",
        title: "Anexos",
        noun: "este anexo",
        fields: {
            contrato: "Contrato" Text,
            nombre: "Nombre" Text,
            url: "Archivo" File,
        }
    }
}
